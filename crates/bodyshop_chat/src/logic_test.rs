#[cfg(test)]
mod tests {
    use crate::logic::{
        advance, booking_request, parse_chat_time, upcoming_weekdays, ChatEngine, ChatRequest,
        ConversationState, Stage, TurnContext,
    };
    use bodyshop_common::error::BodyshopError;
    use bodyshop_common::models::{BookingRecord, BookingRequest, TimeSlot};
    use bodyshop_common::services::{BookingService, BoxFuture, SlotAvailability};
    use bodyshop_config::BusinessConfig;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use chrono_tz::America::New_York;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockBookingService {
        calls: AtomicUsize,
        requests: Mutex<Vec<BookingRequest>>,
        conflict: bool,
    }

    impl BookingService for MockBookingService {
        fn create_booking(
            &self,
            request: BookingRequest,
        ) -> BoxFuture<'_, BookingRecord, BodyshopError> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.requests.lock().unwrap().push(request.clone());
                if self.conflict {
                    return Err(BodyshopError::SlotConflict("slot taken".to_string()));
                }
                Ok(BookingRecord {
                    id: "booking-1".to_string(),
                    calendar_event_id: "evt_1".to_string(),
                    html_link: None,
                    start_time: request.start_time,
                    end_time: request.end_time,
                    customer_name: request.customer_name,
                    customer_phone: request.customer_phone,
                    customer_email: request.customer_email,
                    car_make: request.car_make,
                    car_model: request.car_model,
                    service_type: request.service_type,
                    notes: request.notes,
                    created_at: Utc::now(),
                })
            })
        }
    }

    struct FixedAvailability {
        labels: Vec<&'static str>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixedAvailability {
        fn new(labels: Vec<&'static str>) -> Self {
            Self {
                labels,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SlotAvailability for FixedAvailability {
        fn available_slots(&self, _date: NaiveDate) -> BoxFuture<'_, Vec<TimeSlot>, BodyshopError> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if self.fail {
                    return Err(BodyshopError::CalendarUnavailable("timeout".to_string()));
                }
                Ok(self
                    .labels
                    .iter()
                    .map(|label| TimeSlot {
                        label: label.to_string(),
                        start_time: String::new(),
                        end_time: String::new(),
                        available: true,
                    })
                    .collect())
            })
        }
    }

    /// Friday 2025-05-30, 8:00 AM in New York.
    fn friday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 30, 12, 0, 0).unwrap()
    }

    fn ctx(business: &BusinessConfig) -> TurnContext<'_> {
        TurnContext {
            now: friday_morning(),
            tz: New_York,
            business,
            open_times: None,
        }
    }

    fn at(stage: Stage) -> ConversationState {
        ConversationState {
            state: stage,
            ..ConversationState::default()
        }
    }

    fn ready_for_phone() -> ConversationState {
        ConversationState {
            state: Stage::NameProvided,
            service: Some("Dent Repair".to_string()),
            problem: Some("my car has a big dent".to_string()),
            date: Some("06/02/2025".to_string()),
            time: Some("2:00 PM".to_string()),
            name: Some("Dana Smith".to_string()),
            phone: None,
        }
    }

    fn engine(booking: Arc<MockBookingService>, availability: Option<Arc<FixedAvailability>>) -> ChatEngine {
        let availability = availability.map(|a| a as Arc<dyn SlotAvailability>);
        ChatEngine::new(booking, availability, BusinessConfig::default()).unwrap()
    }

    #[test]
    fn test_dent_problem_is_shared_with_one_option() {
        let business = BusinessConfig::default();

        let turn = advance(&at(Stage::Initial), "my car has a big dent", &ctx(&business));

        assert!(turn.reply.to_lowercase().contains("dent"));
        assert_eq!(turn.state.state, Stage::ProblemShared);
        assert_eq!(turn.state.problem.as_deref(), Some("my car has a big dent"));
        assert_eq!(turn.state.service.as_deref(), Some("Dent Repair"));
        assert_eq!(turn.options, vec!["Yes, schedule an appointment".to_string()]);
        assert_eq!(turn.submission, None);
    }

    #[test]
    fn test_collision_offers_insurance_option() {
        let business = BusinessConfig::default();

        let turn = advance(&at(Stage::Initial), "I was in an accident yesterday", &ctx(&business));

        assert_eq!(turn.state.service.as_deref(), Some("Collision Repair"));
        assert_eq!(
            turn.options,
            vec![
                "Yes, schedule an appointment".to_string(),
                "Tell me about insurance claims".to_string()
            ]
        );
    }

    #[test]
    fn test_unmatched_text_is_a_general_problem() {
        let business = BusinessConfig::default();

        let turn = advance(&at(Stage::Initial), "strange rattle in the trunk", &ctx(&business));

        assert_eq!(turn.state.state, Stage::ProblemShared);
        assert_eq!(turn.state.service.as_deref(), Some("General Repair"));
    }

    #[test]
    fn test_faq_and_greeting_keep_initial_state() {
        let business = BusinessConfig::default();
        let start = at(Stage::Initial);

        let hours = advance(&start, "What are your hours?", &ctx(&business));
        assert_eq!(hours.state, start);
        assert!(hours.reply.contains("Monday - Friday"));

        let location = advance(&start, "where are you located?", &ctx(&business));
        assert_eq!(location.state, start);
        assert!(location.reply.contains("123 Main Street"));

        let hello = advance(&start, "Hello!", &ctx(&business));
        assert_eq!(hello.state, start);
        assert!(hello.reply.contains("Auto Body Shop"));
    }

    #[test]
    fn test_transitions_are_deterministic() {
        let business = BusinessConfig::default();
        let cases = [
            (at(Stage::Initial), "my car has a big dent"),
            (at(Stage::ProblemShared), "yes"),
            (at(Stage::ReadyToBook), "06/02/2025"),
            (
                ConversationState {
                    state: Stage::DateSelected,
                    date: Some("06/02/2025".to_string()),
                    ..ConversationState::default()
                },
                "2:00 PM",
            ),
            (at(Stage::TimeSelected), "Dana Smith"),
            (ready_for_phone(), "5551234567"),
        ];

        for (state, message) in cases {
            let first = advance(&state, message, &ctx(&business));
            let second = advance(&state, message, &ctx(&business));
            assert_eq!(first, second, "turn from {:?} with {:?}", state.state, message);
        }
    }

    #[test]
    fn test_yes_offers_next_five_weekdays() {
        let business = BusinessConfig::default();
        let shared = ConversationState {
            state: Stage::ProblemShared,
            problem: Some("dent".to_string()),
            ..ConversationState::default()
        };

        let turn = advance(&shared, "Yes, schedule an appointment", &ctx(&business));

        assert_eq!(turn.state.state, Stage::ReadyToBook);
        assert_eq!(turn.state.problem.as_deref(), Some("dent"));
        assert_eq!(
            turn.options,
            vec!["06/02/2025", "06/03/2025", "06/04/2025", "06/05/2025", "06/06/2025"]
        );
    }

    #[test]
    fn test_declining_returns_to_initial_with_fields_kept() {
        let business = BusinessConfig::default();
        let shared = ConversationState {
            state: Stage::ProblemShared,
            service: Some("Collision Repair".to_string()),
            problem: Some("accident".to_string()),
            ..ConversationState::default()
        };

        let insurance = advance(&shared, "Tell me about insurance claims", &ctx(&business));
        assert_eq!(insurance.state.state, Stage::Initial);
        assert_eq!(insurance.state.service.as_deref(), Some("Collision Repair"));
        assert!(insurance.reply.contains("insurance"));

        let later = advance(&shared, "not right now", &ctx(&business));
        assert_eq!(later.state.state, Stage::Initial);
        assert!(later.reply.contains("(555) 555-0100"));
    }

    #[test]
    fn test_negated_booking_request_returns_to_initial() {
        let business = BusinessConfig::default();
        let shared = ConversationState {
            state: Stage::ProblemShared,
            service: Some("Dent Repair".to_string()),
            problem: Some("dent".to_string()),
            ..ConversationState::default()
        };

        let turn = advance(&shared, "no thanks, I don't want an appointment", &ctx(&business));

        assert_eq!(turn.state.state, Stage::Initial);
        assert_eq!(turn.state.problem.as_deref(), Some("dent"));
        assert!(turn.options.is_empty());
    }

    #[test]
    fn test_damage_reports_with_everyday_words_are_recorded() {
        let business = BusinessConfig::default();

        for (message, service) in [
            ("my door won't open after the crash", "Collision Repair"),
            ("there is so much rust on my fender", "Paint Repair"),
            ("dent where the mirror is", "Dent Repair"),
        ] {
            let turn = advance(&at(Stage::Initial), message, &ctx(&business));
            assert_eq!(turn.state.state, Stage::ProblemShared, "message {:?}", message);
            assert_eq!(turn.state.problem.as_deref(), Some(message));
            assert_eq!(turn.state.service.as_deref(), Some(service));
        }
    }

    #[test]
    fn test_date_selection_offers_open_times() {
        let business = BusinessConfig::default();

        let turn = advance(&at(Stage::ReadyToBook), "How about 6/2/2025?", &ctx(&business));

        assert_eq!(turn.state.state, Stage::DateSelected);
        assert_eq!(turn.state.date.as_deref(), Some("06/02/2025"));
        assert_eq!(turn.options.len(), 8);
        assert_eq!(turn.options[0], "9:00 AM");
        assert_eq!(turn.options[3], "12:00 PM");
        assert_eq!(turn.options[7], "4:00 PM");
    }

    #[test]
    fn test_invalid_dates_reprompt() {
        let business = BusinessConfig::default();
        let ready = at(Stage::ReadyToBook);

        for message in ["next week", "05/29/2025", "05/31/2025", "13/45/2025"] {
            let turn = advance(&ready, message, &ctx(&business));
            assert_eq!(turn.state, ready, "message {:?}", message);
            assert_eq!(turn.options.len(), 5);
        }

        let weekend = advance(&ready, "05/31/2025", &ctx(&business));
        assert!(weekend.reply.contains("weekends"));
    }

    #[test]
    fn test_today_after_closing_has_no_openings() {
        let business = BusinessConfig::default();
        let evening = TurnContext {
            now: Utc.with_ymd_and_hms(2025, 5, 30, 21, 30, 0).unwrap(),
            ..ctx(&business)
        };

        let turn = advance(&at(Stage::ReadyToBook), "05/30/2025", &evening);

        assert_eq!(turn.state.state, Stage::ReadyToBook);
        assert!(turn.reply.contains("no openings"));
    }

    #[test]
    fn test_time_must_match_an_open_slot() {
        let business = BusinessConfig::default();
        let selected = ConversationState {
            state: Stage::DateSelected,
            date: Some("06/02/2025".to_string()),
            ..ConversationState::default()
        };

        let picked = advance(&selected, "2:00 pm works", &ctx(&business));
        assert_eq!(picked.state.state, Stage::TimeSelected);
        assert_eq!(picked.state.time.as_deref(), Some("2:00 PM"));

        for message in ["7:00 PM", "2:30 PM", "afternoon"] {
            let turn = advance(&selected, message, &ctx(&business));
            assert_eq!(turn.state, selected, "message {:?}", message);
            assert_eq!(turn.options.len(), 8);
        }

        let offered = ["9:00 AM".to_string()];
        let live = TurnContext {
            open_times: Some(&offered),
            ..ctx(&business)
        };
        let taken = advance(&selected, "2:00 PM", &live);
        assert_eq!(taken.state, selected);
        assert_eq!(taken.options, vec!["9:00 AM".to_string()]);
    }

    #[test]
    fn test_time_parsing() {
        assert_eq!(parse_chat_time("2:00 pm").as_deref(), Some("2:00 PM"));
        assert_eq!(parse_chat_time("at 09:00 a.m.").as_deref(), Some("9:00 AM"));
        assert_eq!(parse_chat_time("14:00"), None);
        assert_eq!(parse_chat_time("13:00 PM"), None);
    }

    #[test]
    fn test_name_needs_two_characters_and_a_letter() {
        let business = BusinessConfig::default();
        let selected = at(Stage::TimeSelected);

        for message in ["D", "42", "  "] {
            assert_eq!(advance(&selected, message, &ctx(&business)).state, selected);
        }

        let turn = advance(&selected, " Dana Smith ", &ctx(&business));
        assert_eq!(turn.state.state, Stage::NameProvided);
        assert_eq!(turn.state.name.as_deref(), Some("Dana Smith"));
    }

    #[test]
    fn test_short_phone_reprompts() {
        let business = BusinessConfig::default();

        let turn = advance(&ready_for_phone(), "555-1234", &ctx(&business));

        assert_eq!(turn.state, ready_for_phone());
        assert_eq!(turn.submission, None);
    }

    #[test]
    fn test_phone_builds_submission_with_placeholders() {
        let business = BusinessConfig::default();

        let turn = advance(&ready_for_phone(), "555.123.4567", &ctx(&business));

        assert_eq!(turn.state.state, Stage::PhoneProvided);
        assert_eq!(turn.state.phone.as_deref(), Some("(555) 123-4567"));
        let request = turn.submission.unwrap();
        assert_eq!(request.start_time, "2025-06-02T14:00:00-04:00");
        assert_eq!(request.end_time, "2025-06-02T15:00:00-04:00");
        assert_eq!(request.customer_name, "Dana Smith");
        assert_eq!(request.customer_email, "Not provided");
        assert_eq!(request.car_make, "Not specified");
        assert_eq!(request.car_model, "Not specified");
        assert_eq!(request.service_type, "Dent Repair");
        assert_eq!(request.notes.as_deref(), Some("my car has a big dent"));
    }

    #[test]
    fn test_booking_request_defaults_service() {
        let state = ConversationState {
            service: None,
            phone: Some("(555) 123-4567".to_string()),
            time: Some("12:00 PM".to_string()),
            ..ready_for_phone()
        };

        let request = booking_request(&state, New_York).unwrap();

        assert_eq!(request.service_type, "General Repair");
        assert_eq!(request.start_time, "2025-06-02T12:00:00-04:00");
    }

    #[test]
    fn test_upcoming_weekdays_skip_weekends() {
        let saturday = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        assert_eq!(
            upcoming_weekdays(saturday, 2),
            vec!["06/02/2025".to_string(), "06/03/2025".to_string()]
        );
    }

    #[tokio::test]
    async fn test_successful_submission_confirms_with_recap() {
        let booking = Arc::new(MockBookingService::default());
        let engine = engine(booking.clone(), None);

        let turn = engine
            .run_turn(ready_for_phone(), "5551234567", friday_morning())
            .await;

        assert_eq!(turn.state.state, Stage::Confirmed);
        assert!(turn.reply.contains("06/02/2025"));
        assert!(turn.reply.contains("2:00 PM"));
        assert!(turn.reply.contains("Dana Smith"));
        assert_eq!(turn.submission, None);
        assert_eq!(booking.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            booking.requests.lock().unwrap()[0].customer_phone,
            "(555) 123-4567"
        );
    }

    #[tokio::test]
    async fn test_failed_submission_returns_to_name_provided() {
        let booking = Arc::new(MockBookingService {
            conflict: true,
            ..MockBookingService::default()
        });
        let engine = engine(booking.clone(), None);

        let turn = engine
            .run_turn(ready_for_phone(), "5551234567", friday_morning())
            .await;

        assert_eq!(turn.state.state, Stage::NameProvided);
        assert_eq!(turn.state.phone, None);
        assert_eq!(turn.state.name.as_deref(), Some("Dana Smith"));
        assert!(turn.reply.contains("(555) 555-0100"));
        assert_eq!(booking.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_live_availability_limits_offered_times() {
        let availability = Arc::new(FixedAvailability::new(vec!["9:00 AM", "3:00 PM"]));
        let engine = engine(Arc::new(MockBookingService::default()), Some(availability.clone()));

        let dated = engine
            .run_turn(at(Stage::ReadyToBook), "06/02/2025", friday_morning())
            .await;
        assert_eq!(dated.options, vec!["9:00 AM".to_string(), "3:00 PM".to_string()]);

        let taken = engine
            .run_turn(dated.state.clone(), "2:00 PM", friday_morning())
            .await;
        assert_eq!(taken.state.state, Stage::DateSelected);

        let picked = engine
            .run_turn(dated.state, "3:00 PM", friday_morning())
            .await;
        assert_eq!(picked.state.state, Stage::TimeSelected);
        assert_eq!(availability.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_availability_failure_falls_back_to_generated_slots() {
        let availability = Arc::new(FixedAvailability {
            fail: true,
            ..FixedAvailability::new(vec![])
        });
        let engine = engine(Arc::new(MockBookingService::default()), Some(availability));

        let turn = engine
            .run_turn(at(Stage::ReadyToBook), "06/02/2025", friday_morning())
            .await;

        assert_eq!(turn.state.state, Stage::DateSelected);
        assert_eq!(turn.options.len(), 8);
    }

    #[tokio::test]
    async fn test_full_conversation_books_once() {
        let booking = Arc::new(MockBookingService::default());
        let engine = engine(booking.clone(), None);
        let now = friday_morning();
        let mut state = ConversationState::default();

        for message in [
            "my headlights are yellow",
            "yes",
            "06/03/2025",
            "10:00 AM",
            "Sam Lee",
            "(555) 987-6543",
        ] {
            state = engine.run_turn(state, message, now).await.state;
        }

        assert_eq!(state.state, Stage::Confirmed);
        assert_eq!(state.service.as_deref(), Some("Headlight Restoration"));
        let requests = booking.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].start_time, "2025-06-03T10:00:00-04:00");

        let after = advance(&state, "thanks!", &ctx(&BusinessConfig::default()));
        assert_eq!(after.state, state);
        assert_eq!(after.submission, None);
    }

    #[test]
    fn test_conversation_state_wire_format() {
        let state = ConversationState {
            state: Stage::ProblemShared,
            problem: Some("dent".to_string()),
            ..ConversationState::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, serde_json::json!({"state": "problem_shared", "problem": "dent"}));

        let request: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(request.booking_details.is_none());

        let request: ChatRequest = serde_json::from_str(
            r#"{"message":"yes","bookingDetails":{"state":"ready_to_book"}}"#,
        )
        .unwrap();
        assert_eq!(request.booking_details.unwrap().state, Stage::ReadyToBook);
    }
}
