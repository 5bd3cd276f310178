//! SM-2 style spaced repetition scheduler
//!
//! Computes the next memory state of a card from its current state and a
//! rating. Cards move `new -> learning -> review`; `again` sends any card
//! back to `learning` with a zero interval.
//!
//! Ratings:
//! - again: forgot it, reset progress and lower ease
//! - hard: recalled with serious difficulty
//! - good: recalled after some hesitation
//! - easy: perfect recall

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::models::{CardMemoryState, CardStatus, Rating};

/// Ease factor of a card that has never been reviewed
pub const INITIAL_EASE: f64 = 2.5;

/// Minimum ease factor allowed
pub const MIN_EASE: f64 = 1.3;

/// One day in milliseconds
pub const ONE_DAY_MS: i64 = 86_400_000;

const AGAIN_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;
const EASY_REVIEW_BONUS: f64 = 1.3;
const HARD_REVIEW_MULTIPLIER: f64 = 1.2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid rating: {0:?} (expected again, hard, good, easy or 1-4)")]
    InvalidRating(String),
}

/// Schedule a card using the current wall-clock time
pub fn schedule_card(state: &CardMemoryState, rating: Rating) -> CardMemoryState {
    schedule_card_at(state, rating, Utc::now())
}

/// Schedule a card as if the review happened at `now`
pub fn schedule_card_at(state: &CardMemoryState, rating: Rating, now: DateTime<Utc>) -> CardMemoryState {
    let mut ease = state.ease;
    let interval;
    let status;

    if rating == Rating::Again {
        interval = 0;
        ease = (ease - AGAIN_EASE_PENALTY).max(MIN_EASE);
        status = CardStatus::Learning;
    } else {
        match state.status {
            CardStatus::New => {
                // Fixed onboarding steps, ease is not calibrated yet
                interval = match rating {
                    Rating::Hard => 1,
                    Rating::Good => 2,
                    _ => 4,
                };
                status = CardStatus::Learning;
            }
            CardStatus::Learning => {
                let multiplier = match rating {
                    Rating::Hard => 1.2,
                    Rating::Good => 1.5,
                    _ => 2.0,
                };
                interval = grow(state.interval, multiplier).max(1);
                status = CardStatus::Review;
            }
            CardStatus::Review => {
                interval = match rating {
                    Rating::Hard => {
                        ease = (ease - HARD_EASE_PENALTY).max(MIN_EASE);
                        grow(state.interval, HARD_REVIEW_MULTIPLIER).max(1)
                    }
                    Rating::Good => grow(state.interval, ease),
                    _ => {
                        ease += EASY_EASE_BONUS;
                        // interval * ease * bonus, left to right
                        ceil_days(state.interval as f64 * ease * EASY_REVIEW_BONUS)
                    }
                };
                status = CardStatus::Review;
            }
        }
    }

    CardMemoryState {
        interval,
        ease,
        status,
        due_date: due_date_for(now, interval),
    }
}

/// `ceil(interval * factor)` in whole days, saturating at `u32::MAX`
fn grow(interval: u32, factor: f64) -> u32 {
    ceil_days(interval as f64 * factor)
}

fn ceil_days(days: f64) -> u32 {
    days.ceil() as u32
}

/// `now + interval` days, saturating at the latest representable time
pub fn due_date_for(now: DateTime<Utc>, interval: u32) -> DateTime<Utc> {
    let offset = Duration::milliseconds((interval as i64).saturating_mul(ONE_DAY_MS));
    now.checked_add_signed(offset)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Interval each rating would produce, in again/hard/good/easy order.
/// Used to label the rating buttons.
pub fn preview_intervals(state: &CardMemoryState, now: DateTime<Utc>) -> [u32; 4] {
    Rating::ALL.map(|rating| schedule_card_at(state, rating, now).interval)
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn state(status: CardStatus, interval: u32, ease: f64) -> CardMemoryState {
        CardMemoryState {
            interval,
            ease,
            status,
            due_date: now(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_again_resets_from_every_status() {
        for status in [CardStatus::New, CardStatus::Learning, CardStatus::Review] {
            let result = schedule_card_at(&state(status, 30, 2.5), Rating::Again, now());
            assert_eq!(result.interval, 0);
            assert_eq!(result.status, CardStatus::Learning);
            assert_close(result.ease, 2.3);
            assert_eq!(result.due_date, now());
        }
    }

    #[test]
    fn test_again_respects_ease_floor() {
        let result = schedule_card_at(&state(CardStatus::Review, 10, 1.4), Rating::Again, now());
        assert_close(result.ease, MIN_EASE);
    }

    #[test]
    fn test_new_card_onboarding_intervals() {
        let card = CardMemoryState::new(now());
        let expected = [(Rating::Hard, 1), (Rating::Good, 2), (Rating::Easy, 4)];
        for (rating, interval) in expected {
            let result = schedule_card_at(&card, rating, now());
            assert_eq!(result.interval, interval, "rating {}", rating);
            assert_eq!(result.status, CardStatus::Learning);
            assert_close(result.ease, INITIAL_EASE);
        }
    }

    #[test]
    fn test_learning_graduates_to_review() {
        let card = state(CardStatus::Learning, 2, 2.5);

        let good = schedule_card_at(&card, Rating::Good, now());
        assert_eq!(good.interval, 3);
        assert_eq!(good.status, CardStatus::Review);
        assert_close(good.ease, 2.5);

        assert_eq!(schedule_card_at(&card, Rating::Hard, now()).interval, 3);
        assert_eq!(schedule_card_at(&card, Rating::Easy, now()).interval, 4);
    }

    #[test]
    fn test_learning_after_again_gets_one_day_floor() {
        let card = state(CardStatus::Learning, 0, 2.3);
        for rating in [Rating::Hard, Rating::Good, Rating::Easy] {
            let result = schedule_card_at(&card, rating, now());
            assert_eq!(result.interval, 1);
            assert_eq!(result.status, CardStatus::Review);
        }
    }

    #[test]
    fn test_review_good_multiplies_by_ease() {
        let result = schedule_card_at(&state(CardStatus::Review, 10, 2.5), Rating::Good, now());
        assert_eq!(result.interval, 25);
        assert_close(result.ease, 2.5);
        assert_eq!(result.status, CardStatus::Review);
    }

    #[test]
    fn test_review_easy_raises_ease_then_boosts() {
        let result = schedule_card_at(&state(CardStatus::Review, 10, 2.5), Rating::Easy, now());
        assert_close(result.ease, 2.65);
        assert_eq!(result.interval, 35);
        assert_eq!(result.status, CardStatus::Review);
    }

    #[test]
    fn test_review_hard_lowers_ease_to_floor() {
        let result = schedule_card_at(&state(CardStatus::Review, 10, 1.35), Rating::Hard, now());
        assert_close(result.ease, 1.3);
        assert_eq!(result.interval, 12);
        assert_eq!(result.status, CardStatus::Review);
    }

    #[test]
    fn test_review_easy_lands_on_whole_day_products() {
        // 60 * 1.5 * 1.3 is exactly 117; multiplying ease by the bonus first overshoots
        let result = schedule_card_at(&state(CardStatus::Review, 60, 1.35), Rating::Easy, now());
        assert_close(result.ease, 1.5);
        assert_eq!(result.interval, 117);

        let result = schedule_card_at(&state(CardStatus::Review, 50, 1.65), Rating::Easy, now());
        assert_close(result.ease, 1.8);
        assert_eq!(result.interval, 117);
    }

    #[test]
    fn test_learning_hard_on_whole_day_product() {
        let result = schedule_card_at(&state(CardStatus::Learning, 5, 2.5), Rating::Hard, now());
        assert_eq!(result.interval, 6);
        assert_eq!(result.status, CardStatus::Review);

        let result = schedule_card_at(&state(CardStatus::Review, 5, 2.5), Rating::Hard, now());
        assert_eq!(result.interval, 6);
    }

    #[test]
    fn test_due_date_is_now_plus_interval() {
        let card = state(CardStatus::Review, 10, 2.5);
        let result = schedule_card_at(&card, Rating::Good, now());
        assert_eq!(
            result.due_date.timestamp_millis(),
            now().timestamp_millis() + 25 * ONE_DAY_MS
        );

        // Recomputed from now, not from the previous due date
        let mut late = card.clone();
        late.due_date = now() - Duration::days(40);
        let result = schedule_card_at(&late, Rating::Good, now());
        assert_eq!(result.due_date, now() + Duration::days(25));

        let reset = schedule_card_at(&result, Rating::Again, now());
        assert_eq!(reset.interval, 0);
        assert_eq!(reset.due_date, now());
    }

    #[test]
    fn test_repeated_good_compounds() {
        let mut card = state(CardStatus::Review, 10, 2.5);
        let mut previous = card.interval;
        for _ in 0..4 {
            card = schedule_card_at(&card, Rating::Good, now());
            assert!(card.interval > previous);
            previous = card.interval;
        }
        // 10 -> 25 -> 63 -> 158 -> 395
        assert_eq!(card.interval, 395);
    }

    #[test]
    fn test_repeated_easy_compounds_and_again_resets() {
        let mut card = state(CardStatus::Review, 5, 2.5);
        let mut previous = card.interval;
        for _ in 0..3 {
            card = schedule_card_at(&card, Rating::Easy, now());
            assert!(card.interval > previous);
            previous = card.interval;
        }
        assert!(card.ease > 2.9);

        let reset = schedule_card_at(&card, Rating::Again, now());
        assert_eq!(reset.interval, 0);
        assert_eq!(reset.status, CardStatus::Learning);
    }

    #[test]
    fn test_ease_never_below_floor_for_any_sequence() {
        let sequence = [
            Rating::Again,
            Rating::Hard,
            Rating::Hard,
            Rating::Again,
            Rating::Hard,
            Rating::Good,
            Rating::Again,
            Rating::Hard,
            Rating::Hard,
            Rating::Hard,
            Rating::Again,
            Rating::Again,
        ];
        let mut card = CardMemoryState::new(now());
        for _ in 0..5 {
            for rating in sequence {
                card = schedule_card_at(&card, rating, now());
                assert!(card.ease >= MIN_EASE);
            }
        }
    }

    #[test]
    fn test_status_never_returns_to_new() {
        let mut card = CardMemoryState::new(now());
        for rating in [Rating::Good, Rating::Again, Rating::Easy, Rating::Hard, Rating::Again] {
            card = schedule_card_at(&card, rating, now());
            assert_ne!(card.status, CardStatus::New);
        }
    }

    #[test]
    fn test_huge_interval_saturates() {
        let card = state(CardStatus::Review, u32::MAX / 2, 2.5);
        let result = schedule_card_at(&card, Rating::Easy, now());
        assert_eq!(result.interval, u32::MAX);
        assert_eq!(result.due_date, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_preview_intervals() {
        let card = CardMemoryState::new(now());
        assert_eq!(preview_intervals(&card, now()), [0, 1, 2, 4]);

        let review = state(CardStatus::Review, 10, 2.5);
        assert_eq!(preview_intervals(&review, now()), [0, 12, 25, 35]);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(5), "5d");
        assert_eq!(format_interval(7), "1w");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(30), "1mo");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(365), "1y");
        assert_eq!(format_interval(730), "2y");
    }
}
