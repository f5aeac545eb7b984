use chrono::NaiveTime;
use tracing::debug;

use crate::error::MappingError;
use crate::types::{
    ContestResult, DRAWN_NUMBERS, MAX_BALL, PrizeTier, PrizeTiers, RawPrize, RawRow,
};

/// Converts a Brazilian currency string such as `R$ 1.234,56` to a float.
///
/// Empty input means "no payout" and yields `0.0`.
pub fn parse_currency(text: &str) -> Result<f64, MappingError> {
    if text.trim().is_empty() {
        return Ok(0.0);
    }

    let invalid = || MappingError::InvalidCurrency {
        text: text.to_string(),
    };

    let numeric: String = text
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if numeric.is_empty() || !numeric.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }

    let amount: f64 = numeric.parse().map_err(|_| invalid())?;
    if !amount.is_finite() {
        return Err(invalid());
    }
    Ok(amount)
}

/// Maps every row newer than `low_water_mark` into a [`ContestResult`],
/// keeping the order of the source table.
///
/// A single malformed row fails the whole call.
pub fn map_rows(rows: &[RawRow], low_water_mark: u32) -> Result<Vec<ContestResult>, MappingError> {
    let results = rows
        .iter()
        .filter(|row| row.contest_number > low_water_mark)
        .map(|row| {
            map_row(row).map_err(|e| MappingError::Row {
                contest: row.contest_number,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        total_rows = rows.len(),
        new_contests = results.len(),
        low_water_mark,
        "Rows mapped"
    );
    Ok(results)
}

pub fn map_row(row: &RawRow) -> Result<ContestResult, MappingError> {
    let drawn_numbers = format_drawn_numbers(&row.balls)?;

    let prize_tiers = PrizeTiers {
        fifteen: prize_tier(&row.prizes.fifteen)?,
        fourteen: prize_tier(&row.prizes.fourteen)?,
        thirteen: prize_tier(&row.prizes.thirteen)?,
        twelve: prize_tier(&row.prizes.twelve)?,
        eleven: prize_tier(&row.prizes.eleven)?,
    };

    // One day after the draw; the table carries no real schedule.
    let next_contest_date = row
        .draw_date
        .succ_opt()
        .ok_or(MappingError::DateOverflow(row.draw_date))?;
    let next_contest_number = row
        .contest_number
        .checked_add(1)
        .ok_or(MappingError::ContestOverflow(row.contest_number))?;

    Ok(ContestResult {
        contest_number: row.contest_number,
        draw_date: row.draw_date.and_time(NaiveTime::MIN),
        drawn_numbers,
        accumulated: row.prizes.fifteen.winners == 0,
        prize_tiers,
        accumulated_amount_next_contest: parse_currency(&row.accumulated_next)?,
        next_contest_date: next_contest_date.format("%Y-%m-%d").to_string(),
        next_contest_number,
        favourite_team: String::new(),
        lucky_month: String::new(),
    })
}

fn prize_tier(raw: &RawPrize) -> Result<PrizeTier, MappingError> {
    Ok(PrizeTier {
        winners: raw.winners,
        prize_per_winner: parse_currency(&raw.payout)?,
    })
}

fn format_drawn_numbers(balls: &[u32]) -> Result<Vec<String>, MappingError> {
    let mut numbers = balls.to_vec();
    numbers.sort_unstable();
    numbers.dedup();

    if numbers.len() != DRAWN_NUMBERS {
        return Err(MappingError::DrawnNumberCount {
            expected: DRAWN_NUMBERS,
            found: numbers.len(),
        });
    }
    if let Some(&value) = numbers.iter().find(|n| **n == 0 || **n > MAX_BALL) {
        return Err(MappingError::BallOutOfRange {
            value,
            max: MAX_BALL,
        });
    }

    Ok(numbers.iter().map(|n| format!("{:02}", n)).collect())
}
