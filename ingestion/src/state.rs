use state_machines::state_machine;

state_machine! {
    name: IngestionMachine,
    state: IngestionState,
    initial: Received,
    states: [Received, Parsed, Chunked, GraphWritten, SparseWritten, DenseWritten, Done, Aborted],
    events {
        parse { transition: { from: Received, to: Parsed } }
        chunk { transition: { from: Parsed, to: Chunked } }
        write_graph { transition: { from: Chunked, to: GraphWritten } }
        write_sparse { transition: { from: GraphWritten, to: SparseWritten } }
        write_dense { transition: { from: SparseWritten, to: DenseWritten } }
        finish { transition: { from: DenseWritten, to: Done } }
        abort {
            transition: { from: Received, to: Aborted }
            transition: { from: Parsed, to: Aborted }
            transition: { from: Chunked, to: Aborted }
            transition: { from: GraphWritten, to: Aborted }
            transition: { from: SparseWritten, to: Aborted }
            transition: { from: DenseWritten, to: Aborted }
        }
    }
}

pub fn received() -> IngestionMachine<(), Received> {
    IngestionMachine::new(())
}
