// --- File: crates/bodyshop_chat/src/logic.rs ---
use crate::intent::{classify, detect_faq, is_affirmative, Faq, Intent};
use bodyshop_common::error::BodyshopError;
use bodyshop_common::models::{normalize_phone, BookingRequest};
use bodyshop_common::services::{BookingService, SlotAvailability};
use bodyshop_config::BusinessConfig;
use bodyshop_gcal::logic::{business_tz, generate_slots, local_hour_start};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Date format used in chat messages and options.
pub const CHAT_DATE_FORMAT: &str = "%m/%d/%Y";
/// Number of upcoming weekdays offered when the customer wants to book.
pub const OFFERED_DAYS: usize = 5;
/// Placeholders for booking fields the assistant never asks for.
pub const EMAIL_PLACEHOLDER: &str = "Not provided";
pub const VEHICLE_PLACEHOLDER: &str = "Not specified";
pub const DEFAULT_SERVICE: &str = "General Repair";

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("date pattern is valid")
});
static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*([ap])\.?\s*m\b").expect("time pattern is valid")
});

// --- Data Structures ---

/// Position in the booking conversation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Initial,
    ProblemShared,
    ReadyToBook,
    DateSelected,
    TimeSelected,
    NameProvided,
    PhoneProvided,
    Confirmed,
}

/// Conversation state owned by the client and echoed back on every turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    #[serde(default)]
    pub state: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    /// MM/DD/YYYY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Slot label, e.g. "2:00 PM"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub booking_details: Option<ConversationState>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub content: String,
    pub booking_details: ConversationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Inputs of a turn besides the state and the message.
pub struct TurnContext<'a> {
    pub now: DateTime<Utc>,
    pub tz: Tz,
    pub business: &'a BusinessConfig,
    /// Open slot labels of the date under discussion from a live lookup.
    /// Without it every generated slot counts as open.
    pub open_times: Option<&'a [String]>,
}

/// Outcome of one turn. `submission` is set when the booking must be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub state: ConversationState,
    pub reply: String,
    pub options: Vec<String>,
    pub submission: Option<BookingRequest>,
}

impl Turn {
    fn reply(state: ConversationState, reply: impl Into<String>) -> Self {
        Self {
            state,
            reply: reply.into(),
            options: Vec::new(),
            submission: None,
        }
    }

    fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

impl From<Turn> for ChatResponse {
    fn from(turn: Turn) -> Self {
        Self {
            content: turn.reply,
            booking_details: turn.state,
            options: if turn.options.is_empty() {
                None
            } else {
                Some(turn.options)
            },
        }
    }
}

// --- Parsing helpers ---

/// First MM/DD/YYYY date in the message.
pub fn parse_chat_date(message: &str) -> Option<NaiveDate> {
    let caps = DATE_PATTERN.captures(message)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_chat_date(date: NaiveDate) -> String {
    date.format(CHAT_DATE_FORMAT).to_string()
}

/// First H:MM AM/PM time in the message, rewritten the way slot labels are ("2:00 PM").
pub fn parse_chat_time(message: &str) -> Option<String> {
    let caps = TIME_PATTERN.captures(message)?;
    let hour: u32 = caps[1].parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    Some(format!(
        "{}:{} {}M",
        hour,
        &caps[2],
        caps[3].to_ascii_uppercase()
    ))
}

/// 24-hour clock hour of a whole-hour slot label.
fn label_hour(label: &str) -> Option<u32> {
    let caps = TIME_PATTERN.captures(label)?;
    if &caps[2] != "00" {
        return None;
    }
    let hour: u32 = caps[1].parse().ok()?;
    let pm = caps[3].eq_ignore_ascii_case("p");
    Some(match (hour % 12, pm) {
        (h, false) => h,
        (h, true) => h + 12,
    })
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The next weekdays after `today`, formatted for the chat.
pub fn upcoming_weekdays(today: NaiveDate, count: usize) -> Vec<String> {
    today
        .iter_days()
        .skip(1)
        .filter(|date| !is_weekend(*date))
        .take(count)
        .map(format_chat_date)
        .collect()
}

/// Date whose open times the next turn will need, if any.
pub fn date_under_discussion(state: &ConversationState, message: &str) -> Option<NaiveDate> {
    match state.state {
        Stage::ReadyToBook => parse_chat_date(message),
        Stage::DateSelected => state.date.as_deref().and_then(parse_chat_date),
        _ => None,
    }
}

fn open_times(date: NaiveDate, ctx: &TurnContext<'_>) -> Vec<String> {
    match ctx.open_times {
        Some(labels) => labels.to_vec(),
        None => generate_slots(date, ctx.now, ctx.tz)
            .into_iter()
            .filter(|slot| slot.available)
            .map(|slot| slot.label)
            .collect(),
    }
}

fn faq_answer(faq: Faq, business: &BusinessConfig) -> String {
    match faq {
        Faq::Hours => format!(
            "We're open {}. Tell me what's going on with your vehicle and I can help you book a visit.",
            business.hours_display
        ),
        Faq::Location => format!(
            "You'll find {} at {}. Tell me what's going on with your vehicle and I can help you book a visit.",
            business.name, business.address
        ),
        Faq::Price => format!(
            "Every repair is different, so we give free estimates once we've seen the damage. \
             Tell me what happened, or call us at {} for a quick answer.",
            business.phone
        ),
        Faq::Insurance => format!(
            "We work with all major insurance companies and can help you open your claim. \
             Bring your claim number if you have one, or call us at {} and we'll walk you through it.",
            business.phone
        ),
    }
}

/// Builds the booking the assistant submits. Fields the chat never asks for get placeholders.
pub fn booking_request(state: &ConversationState, tz: Tz) -> Option<BookingRequest> {
    let date = parse_chat_date(state.date.as_deref()?)?;
    let hour = label_hour(state.time.as_deref()?)?;
    let start = local_hour_start(date, hour, tz)?;
    let end = start + Duration::hours(1);

    Some(BookingRequest {
        start_time: start.to_rfc3339(),
        end_time: end.to_rfc3339(),
        customer_name: state.name.clone()?,
        customer_phone: state.phone.clone()?,
        customer_email: EMAIL_PLACEHOLDER.to_string(),
        car_make: VEHICLE_PLACEHOLDER.to_string(),
        car_model: VEHICLE_PLACEHOLDER.to_string(),
        service_type: state
            .service
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
        notes: state.problem.clone(),
    })
}

// --- State machine ---

/// Computes the next state, reply and options for one message.
///
/// Pure: the same state, message and context always give the same turn. The
/// only effect a turn can ask for is the booking submission it returns.
pub fn advance(state: &ConversationState, message: &str, ctx: &TurnContext<'_>) -> Turn {
    let message = message.trim();
    match state.state {
        Stage::Initial => initial(state, message, ctx.business),
        Stage::ProblemShared => problem_shared(state, message, ctx),
        Stage::ReadyToBook => ready_to_book(state, message, ctx),
        Stage::DateSelected => date_selected(state, message, ctx),
        Stage::TimeSelected => time_selected(state, message),
        Stage::NameProvided | Stage::PhoneProvided => name_provided(state, message, ctx),
        Stage::Confirmed => confirmed(state, ctx.business),
    }
}

fn initial(state: &ConversationState, message: &str, business: &BusinessConfig) -> Turn {
    if message.is_empty() {
        return Turn::reply(
            state.clone(),
            "Tell me what's going on with your vehicle and I'll help you get it fixed.",
        );
    }
    match classify(message) {
        Intent::Greeting => Turn::reply(
            state.clone(),
            format!(
                "Hi! Welcome to {}. Tell me what's going on with your vehicle and I'll help you get it fixed.",
                business.name
            ),
        ),
        Intent::Faq(faq) => Turn::reply(state.clone(), faq_answer(faq, business)),
        Intent::Problem(category) => {
            let next = ConversationState {
                state: Stage::ProblemShared,
                service: Some(category.service_type().to_string()),
                problem: Some(message.to_string()),
                ..state.clone()
            };
            Turn::reply(next, category.empathy_reply()).with_options(category.follow_up_options())
        }
    }
}

fn problem_shared(state: &ConversationState, message: &str, ctx: &TurnContext<'_>) -> Turn {
    if is_affirmative(message) {
        let next = ConversationState {
            state: Stage::ReadyToBook,
            ..state.clone()
        };
        let today = ctx.now.with_timezone(&ctx.tz).date_naive();
        return Turn::reply(
            next,
            "Great! Which day works best for you? Pick one of the dates below or type a date as MM/DD/YYYY.",
        )
        .with_options(upcoming_weekdays(today, OFFERED_DAYS));
    }

    let next = ConversationState {
        state: Stage::Initial,
        ..state.clone()
    };
    let reply = match detect_faq(message) {
        Some(faq) => faq_answer(faq, ctx.business),
        None => format!(
            "No problem. Whenever you're ready to book, just let me know, or call us at {}.",
            ctx.business.phone
        ),
    };
    Turn::reply(next, reply)
}

fn ready_to_book(state: &ConversationState, message: &str, ctx: &TurnContext<'_>) -> Turn {
    let today = ctx.now.with_timezone(&ctx.tz).date_naive();
    let reprompt = |reply: String| {
        Turn::reply(state.clone(), reply).with_options(upcoming_weekdays(today, OFFERED_DAYS))
    };

    let Some(date) = parse_chat_date(message) else {
        return reprompt(
            "Please pick one of the dates below or type a date as MM/DD/YYYY.".to_string(),
        );
    };
    let shown = format_chat_date(date);
    if date < today {
        return reprompt(format!("{} has already passed. Please choose an upcoming day.", shown));
    }
    if is_weekend(date) {
        return reprompt(format!(
            "We're closed on weekends. Our hours are {}. Please choose a weekday.",
            ctx.business.hours_display
        ));
    }

    let times = open_times(date, ctx);
    if times.is_empty() {
        return reprompt(format!(
            "Sorry, there are no openings left on {}. Please choose another day.",
            shown
        ));
    }

    let next = ConversationState {
        state: Stage::DateSelected,
        date: Some(shown.clone()),
        ..state.clone()
    };
    Turn::reply(
        next,
        format!("Here are the open times on {}. Which one works for you?", shown),
    )
    .with_options(times)
}

fn date_selected(state: &ConversationState, message: &str, ctx: &TurnContext<'_>) -> Turn {
    let Some(date) = state.date.as_deref().and_then(parse_chat_date) else {
        let next = ConversationState {
            state: Stage::ReadyToBook,
            date: None,
            ..state.clone()
        };
        return ready_to_book(&next, "", ctx);
    };
    let shown = format_chat_date(date);
    let times = open_times(date, ctx);

    match parse_chat_time(message) {
        Some(label) if times.contains(&label) => {
            let next = ConversationState {
                state: Stage::TimeSelected,
                time: Some(label.clone()),
                ..state.clone()
            };
            Turn::reply(
                next,
                format!("{} on {} it is. May I have your name?", label, shown),
            )
        }
        _ => Turn::reply(
            state.clone(),
            format!("Please choose one of the open times on {}.", shown),
        )
        .with_options(times),
    }
}

fn time_selected(state: &ConversationState, message: &str) -> Turn {
    let valid = message.chars().count() >= 2 && message.chars().any(char::is_alphabetic);
    if !valid {
        return Turn::reply(state.clone(), "Could you tell me your name, please?");
    }
    let next = ConversationState {
        state: Stage::NameProvided,
        name: Some(message.to_string()),
        ..state.clone()
    };
    Turn::reply(
        next,
        format!("Thanks, {}! What's the best phone number to reach you?", message),
    )
}

fn name_provided(state: &ConversationState, message: &str, ctx: &TurnContext<'_>) -> Turn {
    let digits: String = message.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        let next = ConversationState {
            state: Stage::NameProvided,
            phone: None,
            ..state.clone()
        };
        return Turn::reply(
            next,
            "Please enter a phone number with at least 10 digits, like (555) 555-0100.",
        );
    }

    let next = ConversationState {
        state: Stage::PhoneProvided,
        phone: Some(normalize_phone(&digits)),
        ..state.clone()
    };
    match booking_request(&next, ctx.tz) {
        Some(request) => Turn {
            state: next,
            reply: "One moment while I book your appointment.".to_string(),
            options: Vec::new(),
            submission: Some(request),
        },
        None => booking_failed(next, None, ctx.business),
    }
}

fn confirmed(state: &ConversationState, business: &BusinessConfig) -> Turn {
    Turn::reply(
        state.clone(),
        format!(
            "You're booked for {} at {}. If you need to change anything, call us at {}.",
            state.date.as_deref().unwrap_or_default(),
            state.time.as_deref().unwrap_or_default(),
            business.phone
        ),
    )
}

fn booking_failed(
    state: ConversationState,
    error: Option<&BodyshopError>,
    business: &BusinessConfig,
) -> Turn {
    let next = ConversationState {
        state: Stage::NameProvided,
        phone: None,
        ..state
    };
    let reply = match error {
        Some(BodyshopError::SlotConflict(_)) => format!(
            "I'm sorry, that time was just taken by another customer. Please call us at {} and we'll find you another slot.",
            business.phone
        ),
        _ => format!(
            "I'm sorry, I couldn't complete your booking. Please send your phone number again to retry, or call us at {}.",
            business.phone
        ),
    };
    Turn::reply(next, reply)
}

/// Final turn after the booking was submitted.
pub fn finish_submission(
    state: ConversationState,
    outcome: Result<(), BodyshopError>,
    business: &BusinessConfig,
) -> Turn {
    match outcome {
        Ok(()) => {
            let reply = format!(
                "You're all set, {}! Your appointment is booked for {} at {}. We'll call you at {} if anything changes.",
                state.name.as_deref().unwrap_or_default(),
                state.date.as_deref().unwrap_or_default(),
                state.time.as_deref().unwrap_or_default(),
                state.phone.as_deref().unwrap_or_default()
            );
            let next = ConversationState {
                state: Stage::Confirmed,
                ..state
            };
            Turn::reply(next, reply)
        }
        Err(err) => booking_failed(state, Some(&err), business),
    }
}

// --- Driver ---

/// Runs turns against live availability and submits finished bookings.
pub struct ChatEngine {
    booking: Arc<dyn BookingService>,
    availability: Option<Arc<dyn SlotAvailability>>,
    business: BusinessConfig,
    tz: Tz,
}

impl ChatEngine {
    pub fn new(
        booking: Arc<dyn BookingService>,
        availability: Option<Arc<dyn SlotAvailability>>,
        business: BusinessConfig,
    ) -> Result<Self, BodyshopError> {
        let tz = business_tz(&business.time_zone)?;
        Ok(Self {
            booking,
            availability,
            business,
            tz,
        })
    }

    pub fn business(&self) -> &BusinessConfig {
        &self.business
    }

    async fn live_open_times(&self, date: NaiveDate) -> Option<Vec<String>> {
        let availability = self.availability.as_ref()?;
        match availability.available_slots(date).await {
            Ok(slots) => Some(slots.into_iter().map(|slot| slot.label).collect()),
            Err(err) => {
                // Offer generated slots; the writer re-checks at submission.
                warn!(%date, error = %err, "Live availability failed, offering generated slots");
                None
            }
        }
    }

    /// One conversation turn at `now`. Never fails: problems become replies.
    pub async fn run_turn(
        &self,
        state: ConversationState,
        message: &str,
        now: DateTime<Utc>,
    ) -> Turn {
        let live = match date_under_discussion(&state, message) {
            Some(date) => self.live_open_times(date).await,
            None => None,
        };
        let ctx = TurnContext {
            now,
            tz: self.tz,
            business: &self.business,
            open_times: live.as_deref(),
        };

        let mut turn = advance(&state, message, &ctx);
        debug!(from = ?state.state, to = ?turn.state.state, "Chat turn");

        let Some(request) = turn.submission.take() else {
            return turn;
        };
        let outcome = match self.booking.create_booking(request).await {
            Ok(record) => {
                info!(event_id = %record.calendar_event_id, start = %record.start_time, "Chat booking confirmed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Chat booking failed");
                Err(err)
            }
        };
        finish_submission(turn.state, outcome, &self.business)
    }
}
