//! Flow tests for the pipeline driver

#[cfg(test)]
mod tests {
    use crate::{ExtractorError, PipelineConfig, PipelineDriver, PromptCatalog};
    use docket_domain::{FailureKind, ProcessingOutcome, PromptEntry};
    use docket_llm::{BackendError, JobApi, JobBackend, JobHandle, JobState, MockBackend};
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn catalog() -> PromptCatalog {
        PromptCatalog::new(vec![
            PromptEntry::new("Invoices", "Invoice totals", "Extract the total as JSON."),
            PromptEntry::new("Deeds", "Deed parties", "Extract grantor and grantee as JSON.")
                .with_alternate_key("Old Deeds"),
        ])
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn driver(backend: MockBackend) -> PipelineDriver<MockBackend> {
        PipelineDriver::new(backend, catalog(), PipelineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_invoice_is_committed() -> anyhow::Result<()> {
        // --- Arrange ---
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "Total: 100\n\n");
        let driver = driver(MockBackend::new(r#"{"total": 100}"#));

        // --- Act ---
        let report = driver.run(dir.path()).await?;

        // --- Assert ---
        assert_eq!(report.committed(), 1);
        assert_eq!(report.files[0].prompt_name.as_deref(), Some("Invoice totals"));
        assert_eq!(
            read_json(&dir.path().join("Invoices/a_result.json")),
            json!({"response": {"total": 100}})
        );
        assert!(dir.path().join("Invoices/Processed/a.txt").exists());
        assert!(!dir.path().join("Invoices/a.txt").exists());

        let calls = driver.backend().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Extract the total as JSON.");
        assert_eq!(calls[0].1, "Total: 100");
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_its_document() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "alpha");
        write(dir.path(), "Invoices/b.txt", "bravo");
        write(dir.path(), "Invoices/c.txt", "charlie");

        let mut backend = MockBackend::new(r#"{"ok": true}"#);
        backend.add_response("bravo", "Sorry, I cannot help with that.");
        let report = driver(backend).run(dir.path()).await?;

        assert_eq!(report.committed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.files[1].outcome.failure_kind(), Some(FailureKind::ResponseParse));

        assert!(dir.path().join("Invoices/Processed/a.txt").exists());
        assert!(dir.path().join("Invoices/Processed/c.txt").exists());
        assert!(dir.path().join("Invoices/b.txt").exists());
        assert!(!dir.path().join("Invoices/b_result.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "Total: 100");
        write(dir.path(), "Deeds/d.txt", "Smith to Jones");
        let driver = driver(MockBackend::new(r#"{"x": 1}"#));

        let first = driver.run(dir.path()).await?;
        assert_eq!(first.committed(), 2);
        let result_before = fs::read_to_string(dir.path().join("Invoices/a_result.json"))?;

        let second = driver.run(dir.path()).await?;
        assert!(second.files.is_empty());
        assert_eq!(driver.backend().call_count(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("Invoices/a_result.json"))?,
            result_before
        );
        assert_ne!(first.run_id, second.run_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_folder_is_skipped() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Misc/x.txt", "something");
        let driver = driver(MockBackend::default());

        let report = driver.run(dir.path()).await?;

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.files[0].outcome.failure_kind(), Some(FailureKind::PromptNotFound));
        assert!(report.files[0].prompt_name.is_none());
        assert!(dir.path().join("Misc/x.txt").exists());
        assert_eq!(driver.backend().call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_alternate_folder_name_resolves() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Old Deeds/d.txt", "Smith to Jones");

        let report = driver(MockBackend::default()).run(dir.path()).await?;

        assert_eq!(report.committed(), 1);
        assert_eq!(report.files[0].prompt_name.as_deref(), Some("Deed parties"));
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_error_leaves_source_in_place() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "corrupt scan");

        let mut backend = MockBackend::default();
        backend.add_error("corrupt");
        let report = driver(backend).run(dir.path()).await?;

        assert_eq!(
            report.files[0].outcome.failure_kind(),
            Some(FailureKind::BackendTransport)
        );
        assert!(dir.path().join("Invoices/a.txt").exists());
        assert!(!dir.path().join("Invoices/Processed").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_fenced_response_is_committed() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "Total: 7");

        let backend = MockBackend::new("```json\n{\"total\": 7}\n```");
        let report = driver(backend).run(dir.path()).await?;

        assert_eq!(report.committed(), 1);
        assert_eq!(
            read_json(&dir.path().join("Invoices/a_result.json"))["response"]["total"],
            7
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_chunk_responses_are_joined_before_validation() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "w1 w2 w3\nw4 w5 w6");

        let mut backend = MockBackend::default();
        backend.add_response("w1", "[1,");
        backend.add_response("w4", "2]");
        // "Extract the total as JSON." is 5 words, leaving 3 per chunk
        let driver = driver(backend).with_context_tokens(8);
        let report = driver.run(dir.path()).await?;

        assert_eq!(report.files[0].chunks, 2);
        let chunks: Vec<String> = driver.backend().calls().into_iter().map(|(_, c)| c).collect();
        assert_eq!(chunks, vec!["w1 w2 w3", "w4 w5 w6"]);
        assert_eq!(
            read_json(&dir.path().join("Invoices/a_result.json")),
            json!({"response": [1, 2]})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_first_chunk_object_kept_when_join_is_not_json() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "w1 w2 w3\nw4 w5 w6");

        let mut backend = MockBackend::default();
        backend.add_response("w1", r#"{"total": 100, "page": 1}"#);
        backend.add_response("w4", r#"{"total": 100, "page": 2}"#);
        let driver = driver(backend).with_context_tokens(8);
        let report = driver.run(dir.path()).await?;

        assert_eq!(report.committed(), 1);
        assert_eq!(report.files[0].chunks, 2);
        assert_eq!(
            read_json(&dir.path().join("Invoices/a_result.json")),
            json!({"response": {"total": 100, "page": 1}})
        );
        assert!(dir.path().join("Invoices/Processed/a.txt").exists());

        let second = driver.run(dir.path()).await?;
        assert!(second.files.is_empty());
        assert_eq!(driver.backend().call_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_later_chunk_kept_when_earlier_chunks_are_not_json() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "w1 w2 w3\nw4 w5 w6");

        let mut backend = MockBackend::default();
        backend.add_response("w1", "No total on this page.");
        backend.add_response("w4", r#"{"total": 42}"#);
        let report = driver(backend).with_context_tokens(8).run(dir.path()).await?;

        assert_eq!(report.committed(), 1);
        assert_eq!(
            read_json(&dir.path().join("Invoices/a_result.json")),
            json!({"response": {"total": 42}})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_no_valid_chunk_fails_the_document() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "w1 w2 w3\nw4 w5 w6");

        let report = driver(MockBackend::new("I could not find a total."))
            .with_context_tokens(8)
            .run(dir.path())
            .await?;

        assert_eq!(report.files[0].outcome.failure_kind(), Some(FailureKind::ResponseParse));
        assert!(dir.path().join("Invoices/a.txt").exists());
        Ok(())
    }

    /// Job service whose final state is chosen by the submitted document
    struct ScriptedJobs;

    impl JobApi for ScriptedJobs {
        async fn submit(&self, _prompt_text: &str, document_text: &str) -> Result<JobHandle, BackendError> {
            if document_text == "unreachable" {
                return Err(BackendError::Communication("connection refused".to_string()));
            }
            Ok(JobHandle(document_text.to_string()))
        }

        async fn poll(&self, handle: &JobHandle) -> Result<JobState, BackendError> {
            Ok(match handle.0.as_str() {
                "rejected" => JobState::Failed,
                "quarantined" => JobState::Unknown("quarantined".to_string()),
                "stuck" => JobState::Processing,
                _ => JobState::Processed,
            })
        }

        async fn retrieve(&self, _handle: &JobHandle) -> Result<String, BackendError> {
            Ok(r#"{"total": 1}"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_job_end_states_map_to_failure_kinds() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "rejected");
        write(dir.path(), "Invoices/b.txt", "quarantined");
        write(dir.path(), "Invoices/c.txt", "stuck");
        write(dir.path(), "Invoices/d.txt", "unreachable");
        write(dir.path(), "Invoices/e.txt", "fine");

        let backend = JobBackend::new(ScriptedJobs, Duration::from_millis(1), 2);
        let driver = PipelineDriver::new(backend, catalog(), PipelineConfig::default())?;
        let report = driver.run(dir.path()).await?;

        let kinds: Vec<_> = report.files.iter().map(|f| f.outcome.failure_kind()).collect();
        assert_eq!(
            kinds,
            vec![
                Some(FailureKind::BackendTerminal),
                Some(FailureKind::BackendTerminal),
                Some(FailureKind::BackendTerminal),
                Some(FailureKind::BackendTransport),
                None,
            ]
        );
        assert_eq!(report.failure_counts().get("backend_terminal"), Some(&3));
        assert!(dir.path().join("Invoices/a.txt").exists());
        assert!(dir.path().join("Invoices/Processed/e.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_document_handling() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/empty.txt", "\n   \n");

        let submitted = driver(MockBackend::new(r#"{"total": null}"#));
        let report = submitted.run(dir.path()).await?;
        assert_eq!(report.committed(), 1);
        assert_eq!(submitted.backend().calls()[0].1, "");

        write(dir.path(), "Invoices/empty2.txt", "");
        let config = PipelineConfig {
            skip_empty_documents: true,
            ..Default::default()
        };
        let skipping = PipelineDriver::new(MockBackend::default(), catalog(), config)?;
        let report = skipping.run(dir.path()).await?;

        assert_eq!(report.skipped(), 1);
        assert!(matches!(
            &report.files[0].outcome,
            ProcessingOutcome::Skipped { kind: FailureKind::DocumentRead, .. }
        ));
        assert_eq!(skipping.backend().call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "Total: 1");
        // A file named like the processed folder blocks the move
        write(dir.path(), "Invoices/Processed", "");

        let report = driver(MockBackend::default()).run(dir.path()).await?;

        assert_eq!(report.persistence_failures(), 1);
        assert!(dir.path().join("Invoices/a.txt").exists());
        assert!(!dir.path().join("Invoices/a_result.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_discovery_rules() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "root_note.txt", "ignored");
        write(dir.path(), "Invoices/b.txt", "b");
        write(dir.path(), "Invoices/A.TXT", "a");
        write(dir.path(), "Invoices/scan.pdf", "pdf");
        write(dir.path(), "Invoices/a_result.json", "{}");
        write(dir.path(), "Invoices/Processed/old.txt", "done");
        write(dir.path(), "Clients/Processed/Invoices/deep.txt", "done");
        write(dir.path(), "Clients/Invoices/nested.txt", "n");

        let driver = driver(MockBackend::default());
        let found = driver.discover(dir.path())?;
        let relative: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(
            relative,
            vec!["Clients/Invoices/nested.txt", "Invoices/A.TXT", "Invoices/b.txt"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_root_inside_processed_folder_is_walked() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let root = dir.path().join("Processed/inbox");
        write(&root, "Invoices/a.txt", "Total: 3");
        write(&root, "Invoices/Processed/done.txt", "done");

        let found = driver(MockBackend::default()).discover(&root)?;

        assert_eq!(found, vec![root.join("Invoices/a.txt")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_preview_makes_no_backend_calls() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "Invoices/a.txt", "Total: 100");
        write(dir.path(), "Misc/x.txt", "?");

        let driver = driver(MockBackend::default());
        let planned = driver.preview(dir.path())?;

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].prompt_name.as_deref(), Some("Invoice totals"));
        assert_eq!(planned[1].folder_key, "Misc");
        assert!(planned[1].prompt_name.is_none());
        assert_eq!(driver.backend().call_count(), 0);
        assert!(dir.path().join("Invoices/a.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let driver = driver(MockBackend::default());
        let result = driver.run(Path::new("/nonexistent/docket-root")).await;
        assert!(matches!(result, Err(ExtractorError::RootNotFound(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            extensions: Vec::new(),
            ..Default::default()
        };
        let result = PipelineDriver::new(MockBackend::default(), catalog(), config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }
}
