#[cfg(test)]
mod tests {
    use crate::backend::mock::{InMemoryBackend, Scripted};
    use crate::backend::RawResponse;
    use crate::catalog::ServiceOption;
    use crate::contact::{ContactInfo, ValidationError};
    use crate::identity::DeviceIdentity;
    use crate::slots::generate;
    use crate::submitter::{
        classify_booking_response, BookingError, BookingPayload, BookingSubmitter,
        GENERIC_SERVER_MESSAGE,
    };
    use crate::window::{BookableSlot, BusinessZone, CalendarDay, OpenWindow};
    use http::StatusCode;
    use slotbook_common::SlotbookError;
    use std::sync::Arc;

    fn zone() -> BusinessZone {
        BusinessZone::default()
    }

    fn windows() -> Vec<OpenWindow> {
        vec![OpenWindow::parse(
            zone(),
            "2025-03-05T09:00:00",
            "2025-03-05T11:00:00",
            Some("free-1".to_string()),
        )
        .unwrap()]
    }

    fn first_slot() -> BookableSlot {
        let day = CalendarDay::from_ymd(2025, 3, 5).unwrap();
        generate(&windows(), day, 30).remove(0)
    }

    fn haircut() -> ServiceOption {
        ServiceOption::new("Pánský střih", 30).unwrap()
    }

    fn contact() -> ContactInfo {
        ContactInfo::new(" Jana ", "jana@example.cz")
    }

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("device-abc").unwrap()
    }

    fn setup() -> (Arc<InMemoryBackend>, BookingSubmitter<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::with_windows(zone(), windows()));
        let submitter = BookingSubmitter::new(Arc::clone(&backend));
        (backend, submitter)
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = BookingPayload::new(&first_slot(), &haircut(), &contact());
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "slot": {
                    "start": "2025-03-05T09:00:00+01:00",
                    "end": "2025-03-05T09:30:00+01:00"
                },
                "customerInfo": {
                    "name": "Jana",
                    "email": "jana@example.cz",
                    "haircut": "Pánský střih"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_accepted_booking() {
        let (backend, submitter) = setup();
        let confirmation = submitter
            .submit(&first_slot(), &haircut(), &contact(), &identity())
            .await
            .unwrap();

        assert_eq!(confirmation.slot, first_slot());
        assert_eq!(confirmation.event_id.as_deref(), Some("evt-1"));
        assert_eq!(confirmation.body["customerInfo"]["haircut"], "Pánský střih");
        assert_eq!(backend.booking_requests(), 1);
        assert_eq!(backend.identities(), vec!["device-abc".to_string()]);
        // The booked half hour is gone from the backend's windows
        assert_eq!(backend.windows().len(), 1);
        assert_eq!(backend.windows()[0].start(), first_slot().end());
    }

    #[tokio::test]
    async fn test_taken_slot_is_stale() {
        let (backend, submitter) = setup();
        backend.set_windows(Vec::new());

        let err = submitter
            .submit(&first_slot(), &haircut(), &contact(), &identity())
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::StaleSlot);
        assert!(err.requires_refetch());
        assert!(err.to_string().contains("pick again"));
    }

    #[tokio::test]
    async fn test_rate_limited_is_sent_once() {
        let (backend, submitter) = setup();
        backend.set_rate_limited(true);

        let err = submitter
            .submit(&first_slot(), &haircut(), &contact(), &identity())
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::RateLimited);
        assert!(!err.requires_refetch());
        assert_eq!(backend.booking_requests(), 1);
    }

    #[tokio::test]
    async fn test_server_error_keeps_detail() {
        let (backend, submitter) = setup();
        backend.script_booking(Scripted::Respond(RawResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail":"Calendar API quota exceeded"}"#,
        )));

        let err = submitter
            .submit(&first_slot(), &haircut(), &contact(), &identity())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BookingError::ServerError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Calendar API quota exceeded".to_string()
            }
        );
        assert_eq!(err.to_string(), "Calendar API quota exceeded");
    }

    #[test]
    fn test_server_error_without_detail_is_generic() {
        for body in ["", "not json", r#"{"detail":""}"#, r#"{"error":"x"}"#] {
            let err = classify_booking_response(
                RawResponse::new(StatusCode::BAD_REQUEST, body),
                &first_slot(),
                &haircut(),
            )
            .unwrap_err();
            assert_eq!(err.to_string(), GENERIC_SERVER_MESSAGE);
        }
    }

    #[test]
    fn test_success_without_body_still_confirms() {
        let confirmation = classify_booking_response(
            RawResponse::new(StatusCode::CREATED, ""),
            &first_slot(),
            &haircut(),
        )
        .unwrap();
        assert_eq!(confirmation.event_id, None);
        assert!(confirmation.body.is_null());
    }

    #[tokio::test]
    async fn test_transport_failure_is_ambiguous() {
        let (backend, submitter) = setup();
        backend.script_booking(Scripted::Fail("connection reset".to_string()));

        let err = submitter
            .submit(&first_slot(), &haircut(), &contact(), &identity())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::TransportError { .. }));
        let message = err.to_string();
        assert!(message.contains("connection reset"));
        assert!(message.contains("may have been recorded"));
        assert!(matches!(SlotbookError::from(err), SlotbookError::HttpError(_)));
    }

    #[tokio::test]
    async fn test_invalid_contact_never_reaches_backend() {
        let (backend, submitter) = setup();
        let err = submitter
            .submit(
                &first_slot(),
                &haircut(),
                &ContactInfo::new("", "jana@example.cz"),
                &identity(),
            )
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::Validation(ValidationError::MissingName));
        assert_eq!(backend.booking_requests(), 0);
    }
}
