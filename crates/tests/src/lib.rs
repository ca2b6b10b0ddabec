//! # Integration Tests
//!
//! End-to-end tests wiring the real crates together:
//! catalogue files on disk -> loader -> scheduler -> dispatcher -> sink.
//!
//! Consumption is always bounded externally (`max_records`); the scheduler
//! itself never terminates.

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::path::PathBuf;

    use catalogue_loader::CatalogueLoader;
    use contracts::{BroadcastError, BroadcastSink, EmittedRecord, SignalValue};
    use dispatcher::{Dispatcher, NoopPacer};
    use scheduler::Scheduler;

    /// Sink that records everything it is sent
    #[derive(Default)]
    struct CollectingSink {
        records: Vec<EmittedRecord>,
        closed: bool,
    }

    impl BroadcastSink for &mut CollectingSink {
        fn name(&self) -> &str {
            "collecting"
        }

        async fn send(&mut self, record: &EmittedRecord) -> Result<(), BroadcastError> {
            self.records.push(record.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), BroadcastError> {
            self.closed = true;
            Ok(())
        }
    }

    fn write_catalogue(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    /// Full pipeline: two files on disk, merged, scheduled and dispatched
    /// without wall-clock waits.
    #[tokio::test]
    async fn test_e2e_files_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_catalogue(
            dir.path(),
            "base.json",
            r#"{
                "A": [{"frequency": 1, "message": "a"}],
                "B": [{"frequency": 2, "message": "stale"}]
            }"#,
        );
        let overlay = write_catalogue(
            dir.path(),
            "overlay.json",
            r#"{
                "B": [{"frequency": 2, "message": "x"},
                      {"frequency": 0, "message": "y"}]
            }"#,
        );

        let catalogue = CatalogueLoader::load(&[base, overlay]).unwrap();
        let scheduler = Scheduler::new(&catalogue).unwrap();

        let mut sink = CollectingSink::default();
        let stats = Dispatcher::new(&mut sink)
            .with_max_records(6)
            .run(scheduler, NoopPacer)
            .await
            .unwrap();

        assert_eq!(stats.records_sent, 6);
        assert!(sink.closed);

        // Overlay replaced B's item list, and the canonical order holds:
        // ticks 0,0,0,2,4,4
        let sequence: Vec<String> = sink
            .records
            .iter()
            .map(|r| match &r.value {
                SignalValue::Json(v) => {
                    format!("{}/{}", r.destination, v.as_str().unwrap())
                }
                other => format!("{}/{}", r.destination, other),
            })
            .collect();
        assert_eq!(sequence, vec!["A/a", "B/x", "B/y", "A/a", "A/a", "B/x"]);
    }

    /// Stored-procedure style catalogue: expression values resolve against
    /// elapsed time and carry addressing fields through to the sink.
    #[tokio::test]
    async fn test_e2e_procedure_catalogue_resolves_expressions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalogue(
            dir.path(),
            "pv.json",
            r#"{
                "pvUpdate": [
                    {"frequency": 1, "instrument": "TEST", "name": "elapsed", "function": "x"}
                ],
                "pvUpdateString": [
                    {"frequency": 0, "instrument": "TEST", "name": "banner", "function": "'t={x}'"}
                ]
            }"#,
        );

        let catalogue = CatalogueLoader::load(&[path]).unwrap();
        let scheduler = Scheduler::new(&catalogue).unwrap();

        let mut sink = CollectingSink::default();
        Dispatcher::new(&mut sink)
            .with_max_records(4)
            .run(scheduler, NoopPacer)
            .await
            .unwrap();

        // tick 0: both; ticks 2 and 4: numeric only
        assert_eq!(sink.records.len(), 4);
        assert_eq!(sink.records[0].destination, "pvUpdate");
        assert_eq!(sink.records[0].instrument.as_deref(), Some("TEST"));
        assert_eq!(sink.records[0].value, SignalValue::Number(0.0));
        assert_eq!(
            sink.records[1].value,
            SignalValue::Text("t=0".to_string())
        );
        assert_eq!(sink.records[2].value, SignalValue::Number(1.0));
        assert_eq!(sink.records[3].value, SignalValue::Number(2.0));
    }

    /// A rebuilt scheduler over the same catalogue replays the identical
    /// tick-aligned sequence from tick 0.
    #[tokio::test]
    async fn test_e2e_restart_replays_sequence() {
        let catalogue = CatalogueLoader::load_from_str(
            r#"{
                "A": [{"frequency": 1.5, "message": "a"}],
                "B": [{"frequency": 0.5, "message": "b"}]
            }"#,
        )
        .unwrap();

        let mut runs = Vec::new();
        for _ in 0..2 {
            let scheduler = Scheduler::new(&catalogue).unwrap();
            let mut sink = CollectingSink::default();
            Dispatcher::new(&mut sink)
                .with_max_records(20)
                .run(scheduler, NoopPacer)
                .await
                .unwrap();
            runs.push(sink.records);
        }

        assert_eq!(runs[0], runs[1]);
    }

    /// The shipped service catalogues load, validate and compile.
    #[test]
    fn test_shipped_service_catalogues_compile() {
        for dir in ["../../services/broker", "../../services/database"] {
            let files = catalogue_loader::default_catalogue_files(std::path::Path::new(dir))
                .unwrap_or_else(|e| panic!("cannot list {dir}: {e}"));
            assert!(!files.is_empty(), "{dir} has no catalogue files");

            let catalogue = CatalogueLoader::load(&files)
                .unwrap_or_else(|e| panic!("{dir} failed to load: {e}"));
            Scheduler::new(&catalogue)
                .unwrap_or_else(|e| panic!("{dir} failed to compile: {e}"));
        }
    }
}
