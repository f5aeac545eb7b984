use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many numbers are drawn in every contest.
pub const DRAWN_NUMBERS: usize = 15;

/// Highest number a ball can carry.
pub const MAX_BALL: u32 = 25;

/// One row of the official results table, already typed by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub contest_number: u32,
    pub draw_date: NaiveDate,
    pub balls: [u32; DRAWN_NUMBERS],
    pub prizes: RawPrizes,
    /// Payout text of the "Acumulado 15 acertos" column.
    pub accumulated_next: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPrize {
    pub winners: u64,
    /// Payout per winner as published, e.g. `R$ 1.234,56`.
    pub payout: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPrizes {
    pub fifteen: RawPrize,
    pub fourteen: RawPrize,
    pub thirteen: RawPrize,
    pub twelve: RawPrize,
    pub eleven: RawPrize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrizeTier {
    #[serde(rename = "vencedores")]
    pub winners: u64,
    #[serde(rename = "premio")]
    pub prize_per_winner: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrizeTiers {
    #[serde(rename = "quinze")]
    pub fifteen: PrizeTier,
    #[serde(rename = "quatorze")]
    pub fourteen: PrizeTier,
    #[serde(rename = "treze")]
    pub thirteen: PrizeTier,
    #[serde(rename = "doze")]
    pub twelve: PrizeTier,
    #[serde(rename = "onze")]
    pub eleven: PrizeTier,
}

/// One drawn contest in the shape the results API stores it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContestResult {
    #[serde(rename = "concurso")]
    pub contest_number: u32,
    #[serde(rename = "data")]
    pub draw_date: NaiveDateTime,
    #[serde(rename = "dezenas")]
    pub drawn_numbers: Vec<String>,
    #[serde(rename = "premiacoes")]
    pub prize_tiers: PrizeTiers,
    #[serde(rename = "acumulou")]
    pub accumulated: bool,
    #[serde(rename = "acumuladaProxConcurso")]
    pub accumulated_amount_next_contest: f64,
    /// `YYYY-MM-DD`, always the day after the draw.
    #[serde(rename = "dataProxConcurso")]
    pub next_contest_date: String,
    #[serde(rename = "proxConcurso")]
    pub next_contest_number: u32,
    // Legacy fields, kept empty for older consumers.
    #[serde(rename = "timeCoracao")]
    pub favourite_team: String,
    #[serde(rename = "mesSorte")]
    pub lucky_month: String,
}

#[derive(Serialize, Debug)]
pub struct SaveResultsRequest<'a> {
    pub results: &'a [ContestResult],
}

/// Identity used to obtain a bearer token.
#[derive(Serialize, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Bearer credential for a single run. Never persisted, never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LastContestResponse {
    #[serde(rename = "concurso", default)]
    pub contest_number: Option<u32>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub records_processed: usize,
}
