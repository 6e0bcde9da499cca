//! tests/dispatch_tests.rs
//! Pruebas del núcleo: resolución, validación por destinatario,
//! loop de despacho y agregación de resultados parciales.

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use actix_rt::test;
    use anyhow::{anyhow, Result};
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::models::group_model::{DirectoryUser, GroupMember};
    use crate::models::recipient_model::{DispatchStatus, Recipient, SpreadsheetRow};
    use crate::services::directory_service::merge_group_members;
    use crate::services::dispatch_service::{
        resolve_delimited, resolve_members, resolve_rows, run_batch, validate_recipient,
        validate_sender_id, BatchOptions, SmsSender,
    };
    use crate::services::message_service::MessageService;
    use crate::services::twilio_service::ProviderMessage;

    /// Doble del proveedor: falla para los números configurados y
    /// registra cada llamada (to, from).
    struct MockSender {
        fail_numbers: Vec<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockSender {
        fn new(fail_numbers: &[&str]) -> Self {
            MockSender {
                fail_numbers: fail_numbers.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SmsSender for MockSender {
        async fn send_sms(&self, to: &str, from: &str, _body: &str) -> Result<ProviderMessage> {
            self.calls
                .lock()
                .unwrap()
                .push((to.to_string(), from.to_string()));
            if self.fail_numbers.iter().any(|n| n == to) {
                return Err(anyhow!("The number {} is unverified", to));
            }
            Ok(ProviderMessage {
                sid: format!("SM-{}", to),
                status: Some("queued".to_string()),
            })
        }
    }

    // Helper: historial sobre SQLite en memoria (una sola conexión para
    // que todas las queries vean la misma base).
    async fn test_store() -> MessageService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("No se pudo abrir SQLite en memoria");
        let service = MessageService::new(pool);
        service
            .run_migrations()
            .await
            .expect("Fallo en migraciones");
        service
    }

    fn batch(message: &str, from_name: Option<&str>) -> BatchOptions {
        BatchOptions {
            message: Some(message.to_string()),
            from_name: from_name.map(|s| s.to_string()),
            default_sender: "+15550000000".to_string(),
            max_message_len: 160,
            max_sender_id_len: 11,
        }
    }

    fn recipient(phone: &str) -> Recipient {
        Recipient {
            phone_number: phone.to_string(),
            display_name: None,
            sender_id: None,
            message: None,
        }
    }

    fn member(user_id: &str, name: &str, phone: Option<&str>) -> GroupMember {
        GroupMember {
            user: DirectoryUser {
                id: user_id.to_string(),
                display_name: name.to_string(),
                mail: Some(format!("{}@example.com", user_id)),
                user_principal_name: format!("{}@example.com", user_id),
            },
            phone_number: phone.map(|p| p.to_string()),
            has_phone_number: phone.is_some(),
        }
    }

    // ------------------------------------------------------------------
    // Resolver
    // ------------------------------------------------------------------

    #[test]
    async fn test_resolve_delimited_splits_and_trims() {
        let list = resolve_delimited(" +1555 , ;+1556; ,");
        let phones: Vec<_> = list.iter().map(|r| r.phone_number.as_str()).collect();
        assert_eq!(phones, vec!["+1555", "+1556"]);
    }

    #[test]
    async fn test_resolve_delimited_empty_input() {
        assert!(resolve_delimited("").is_empty());
        assert!(resolve_delimited("  ;, ").is_empty());
    }

    #[test]
    async fn test_resolve_rows_carries_per_row_overrides() {
        let rows = vec![SpreadsheetRow {
            phone_number: Some(" +1555 ".to_string()),
            message: Some("Hola fila".to_string()),
            name: Some("Ana".to_string()),
            sender_id: Some("ALERTS".to_string()),
        }];
        let list = resolve_rows(&rows);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].phone_number, "+1555");
        assert_eq!(list[0].display_name.as_deref(), Some("Ana"));
        assert_eq!(list[0].sender_id.as_deref(), Some("ALERTS"));
        assert_eq!(list[0].message.as_deref(), Some("Hola fila"));
    }

    #[test]
    async fn test_resolve_members_skips_users_without_phone() {
        let members = vec![
            member("u1", "Ana", Some("+1555")),
            member("u2", "Beto", None),
        ];
        let list = resolve_members(&members);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].phone_number, "+1555");
        assert_eq!(list[0].display_name.as_deref(), Some("Ana"));
    }

    #[test]
    async fn test_group_dedupe_first_occurrence_wins() {
        let group_a = vec![
            member("u1", "Ana", Some("+1555")),
            member("u2", "Beto", Some("+1556")),
        ];
        // u2 aparece en ambos grupos, con datos distintos en el segundo
        let group_b = vec![
            member("u2", "Beto (dup)", Some("+9999")),
            member("u3", "Carla", Some("+1557")),
        ];

        let merged = merge_group_members(vec![group_a, group_b]);
        let ids: Vec<_> = merged.iter().map(|m| m.user.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);
        // gana la primera aparición
        assert_eq!(merged[1].user.display_name, "Beto");
        assert_eq!(merged[1].phone_number.as_deref(), Some("+1556"));
    }

    // ------------------------------------------------------------------
    // Validador
    // ------------------------------------------------------------------

    #[test]
    async fn test_sender_id_too_long_rejected() {
        assert!(validate_sender_id("ABCDEFGHIJKL", 11).is_some()); // 12 chars
        assert!(validate_sender_id("COMPANY", 11).is_none());
    }

    #[test]
    async fn test_sender_id_must_contain_letter() {
        assert!(validate_sender_id("1234567", 11).is_some());
        assert!(validate_sender_id("A1234", 11).is_none());
    }

    #[test]
    async fn test_sender_id_charset() {
        assert!(validate_sender_id("MAL*ID", 11).is_some());
        assert!(validate_sender_id("OK +-_&1A", 11).is_none());
    }

    #[test]
    async fn test_sender_id_rejected_regardless_of_message() {
        let mut r = recipient("+1555");
        r.sender_id = Some("123456789012".to_string());
        let reason = validate_recipient(&r, &batch("hola", None)).expect("debería rechazar");
        assert!(reason.contains("11 characters"), "motivo: {}", reason);
    }

    #[test]
    async fn test_message_length_limit_per_batch() {
        let r = recipient("+1555");
        let long_body = "x".repeat(161);
        assert!(validate_recipient(&r, &batch(&long_body, None)).is_some());
        assert!(validate_recipient(&r, &batch("corto", None)).is_none());
    }

    // ------------------------------------------------------------------
    // Loop de despacho + agregación
    // ------------------------------------------------------------------

    #[test]
    async fn test_partial_failure_split() {
        let store = test_store().await;
        let sender = MockSender::new(&["+1556"]);
        let recipients = vec![recipient("+1555"), recipient("+1556")];

        let report = run_batch(&sender, &store, &recipients, &batch("hola", None))
            .await
            .expect("el lote no debe abortar por un fallo individual");

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].phone_number, "+1555");
        assert_eq!(report.results[0].status, DispatchStatus::Sent);
        assert_eq!(report.results[0].message_id.as_deref(), Some("SM-+1555"));

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].phone_number, "+1556");
        assert_eq!(report.errors[0].status, DispatchStatus::Failed);
        assert!(report.errors[0].error.as_deref().unwrap().contains("unverified"));

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.sent, 1);
        assert_eq!(report.summary.failed, 1);
    }

    #[test]
    async fn test_summary_reconciles_with_validated_recipients() {
        let store = test_store().await;
        let sender = MockSender::new(&["+1556"]);
        // dos validados (uno falla en el proveedor) + un rechazo de validación
        let recipients = vec![
            recipient("+1555"),
            recipient("+1556"),
            recipient("sin-prefijo"),
        ];

        let report = run_batch(&sender, &store, &recipients, &batch("hola", None))
            .await
            .unwrap();

        // el rechazo de validación no cuenta en el summary...
        assert_eq!(report.summary.total, 2);
        assert_eq!(
            report.summary.sent + report.summary.failed,
            report.summary.total
        );
        // ...pero sí aparece en errores, junto al fallo del proveedor
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    async fn test_missing_plus_prefix_never_reaches_provider() {
        let store = test_store().await;
        let sender = MockSender::new(&[]);
        let recipients = vec![recipient("1555")];

        let report = run_batch(&sender, &store, &recipients, &batch("hola", None))
            .await
            .unwrap();

        assert!(sender.calls().is_empty(), "no debe llegar al proveedor");
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0]
            .error
            .as_deref()
            .unwrap()
            .contains("country code"));
    }

    #[test]
    async fn test_sender_fallback_to_default_number() {
        let store = test_store().await;
        let sender = MockSender::new(&[]);

        // sin sender ID: se usa el número por defecto del lote
        run_batch(&sender, &store, &[recipient("+1555")], &batch("hola", None))
            .await
            .unwrap();
        // con sender ID compartido
        run_batch(
            &sender,
            &store,
            &[recipient("+1556")],
            &batch("hola", Some("ALERTS")),
        )
        .await
        .unwrap();

        let calls = sender.calls();
        assert_eq!(calls[0], ("+1555".to_string(), "+15550000000".to_string()));
        assert_eq!(calls[1], ("+1556".to_string(), "ALERTS".to_string()));
    }

    #[test]
    async fn test_every_outcome_is_persisted() {
        let store = test_store().await;
        let sender = MockSender::new(&["+1556"]);
        let recipients = vec![
            recipient("+1555"),     // enviado
            recipient("+1556"),     // fallo del proveedor
            recipient("sin-prefijo"), // rechazo de validación
        ];

        let report = run_batch(&sender, &store, &recipients, &batch("hola", None))
            .await
            .unwrap();

        // los tres resultados quedan en el historial antes de responder
        let stored = store.recent_messages(50).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored.iter().filter(|m| m.status == "sent").count(), 1);
        assert_eq!(stored.iter().filter(|m| m.status == "failed").count(), 2);

        // y cada outcome referencia su registro persistido
        for outcome in report.results.iter().chain(report.errors.iter()) {
            assert!(outcome.stored_id.is_some());
        }
    }

    #[test]
    async fn test_bulk_rows_use_per_row_message_and_sender() {
        let store = test_store().await;
        let sender = MockSender::new(&[]);
        let rows = vec![
            SpreadsheetRow {
                phone_number: Some("+1555".to_string()),
                message: Some("Mensaje A".to_string()),
                name: None,
                sender_id: Some("ALERTS".to_string()),
            },
            SpreadsheetRow {
                phone_number: Some("+1556".to_string()),
                message: None, // sin cuerpo => rechazo
                name: None,
                sender_id: None,
            },
        ];
        let recipients = resolve_rows(&rows);
        let options = BatchOptions {
            message: None,
            from_name: None,
            default_sender: "+15550000000".to_string(),
            max_message_len: 1600,
            max_sender_id_len: 11,
        };

        let report = run_batch(&sender, &store, &recipients, &options)
            .await
            .unwrap();

        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.sent, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].phone_number, "+1556");

        let calls = sender.calls();
        assert_eq!(calls, vec![("+1555".to_string(), "ALERTS".to_string())]);
    }
}
