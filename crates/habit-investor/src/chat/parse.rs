//! Answer Parsing
//!
//! Heuristics that turn free-text answers into questionnaire values.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Earliest start year the questionnaire accepts
pub const MIN_YEAR: i32 = 1970;

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));

// A number optionally followed by a standalone thousands/millions word or suffix.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:(тыс[а-яё]*|k|к|млн|миллион[а-яё]*|million)\b)?")
        .expect("valid regex")
});

/// Supported currencies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Rub,
    Amd,
    Kzt,
    Uah,
    Byn,
    Gbp,
    Cny,
}

impl Currency {
    /// Lookup order matters: Belarusian ruble synonyms contain "рубль".
    const SYNONYMS: &'static [(Self, &'static [&'static str])] = &[
        (Self::Usd, &["usd", "доллар", "dollar", "бакс"]),
        (Self::Eur, &["eur", "евро", "euro"]),
        (
            Self::Byn,
            &["byn", "белрубль", "бел.рубль", "белорусский рубль", "byrub", "byr"],
        ),
        (Self::Rub, &["rub", "руб", "ruble"]),
        (Self::Amd, &["amd", "драм", "dram"]),
        (Self::Kzt, &["kzt", "тенге", "tenge"]),
        (Self::Uah, &["uah", "гривн", "hryvnia"]),
        (Self::Gbp, &["gbp", "фунт", "pound"]),
        (Self::Cny, &["cny", "юан", "yuan"]),
    ];

    pub const ALL: [Self; 9] = [
        Self::Usd,
        Self::Eur,
        Self::Rub,
        Self::Amd,
        Self::Kzt,
        Self::Uah,
        Self::Byn,
        Self::Gbp,
        Self::Cny,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Rub => "RUB",
            Self::Amd => "AMD",
            Self::Kzt => "KZT",
            Self::Uah => "UAH",
            Self::Byn => "BYN",
            Self::Gbp => "GBP",
            Self::Cny => "CNY",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// First four-digit group, if it is a year between [`MIN_YEAR`] and `current_year`
pub fn parse_year(text: &str, current_year: i32) -> Option<i32> {
    let year: i32 = YEAR.find(text)?.as_str().parse().ok()?;
    (MIN_YEAR..=current_year).contains(&year).then_some(year)
}

/// Normalized habit description, or `None` when the answer is not a habit
pub fn validate_habit(text: &str) -> Option<String> {
    let habit = text.trim().to_lowercase();
    let rejected = habit.chars().count() < 2
        || habit == "нет"
        || habit == "-"
        || habit.chars().all(|c| c.is_ascii_digit());
    (!rejected).then_some(habit)
}

fn multiplier(word: &str) -> f64 {
    if word.starts_with("млн") || word.starts_with("миллион") || word == "million" {
        1_000_000.0
    } else if word.is_empty() {
        1.0
    } else {
        1_000.0
    }
}

/// Positive amount from digits ("500", "5,5", "2 тыс") or number words ("пятьсот")
pub fn parse_amount(text: &str) -> Option<f64> {
    let text = text.to_lowercase().replace(',', ".");

    let amount = match AMOUNT.captures(&text) {
        Some(caps) => {
            let value: f64 = caps.get(1)?.as_str().parse().ok()?;
            value * multiplier(caps.get(2).map_or("", |m| m.as_str()))
        }
        None => words_to_number(&text)?,
    };

    (amount.is_finite() && amount > 0.0).then_some(amount)
}

fn word_value(word: &str) -> Option<f64> {
    let value = match word {
        "ноль" | "zero" => 0,
        "один" | "одна" | "одну" | "one" => 1,
        "два" | "две" | "two" => 2,
        "три" | "three" => 3,
        "четыре" | "four" => 4,
        "пять" | "five" => 5,
        "шесть" | "six" => 6,
        "семь" | "seven" => 7,
        "восемь" | "eight" => 8,
        "девять" | "nine" => 9,
        "десять" | "ten" => 10,
        "одиннадцать" | "eleven" => 11,
        "двенадцать" | "twelve" => 12,
        "тринадцать" | "thirteen" => 13,
        "четырнадцать" | "fourteen" => 14,
        "пятнадцать" | "fifteen" => 15,
        "шестнадцать" | "sixteen" => 16,
        "семнадцать" | "seventeen" => 17,
        "восемнадцать" | "eighteen" => 18,
        "девятнадцать" | "nineteen" => 19,
        "двадцать" | "twenty" => 20,
        "тридцать" | "thirty" => 30,
        "сорок" | "forty" => 40,
        "пятьдесят" | "fifty" => 50,
        "шестьдесят" | "sixty" => 60,
        "семьдесят" | "seventy" => 70,
        "восемьдесят" | "eighty" => 80,
        "девяносто" | "ninety" => 90,
        "сто" => 100,
        "двести" => 200,
        "триста" => 300,
        "четыреста" => 400,
        "пятьсот" => 500,
        "шестьсот" => 600,
        "семьсот" => 700,
        "восемьсот" => 800,
        "девятьсот" => 900,
        _ => return None,
    };
    Some(f64::from(value))
}

/// Sum Russian or English number words ("две тысячи пятьсот", "five hundred").
/// Words that are not numbers are ignored; `None` if no number word was found.
pub fn words_to_number(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut current = 0.0;
    let mut found = false;

    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
    {
        if let Some(value) = word_value(word) {
            current += value;
            found = true;
        } else if word == "hundred" {
            current = current.max(1.0) * 100.0;
            found = true;
        } else if word.starts_with("тысяч") || word == "thousand" {
            total += current.max(1.0) * 1_000.0;
            current = 0.0;
            found = true;
        } else if word.starts_with("миллион") || word == "million" {
            total += current.max(1.0) * 1_000_000.0;
            current = 0.0;
            found = true;
        } else if word == "полторы" || word == "полтора" {
            current += 1.5;
            found = true;
        }
    }

    found.then_some(total + current)
}

/// Currency named anywhere in the answer
pub fn parse_currency(text: &str) -> Option<Currency> {
    let text = text.trim().to_lowercase();
    Currency::SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| text.contains(s)))
        .map(|(currency, _)| *currency)
}

const CONFIRM_WORDS: &[&str] = &["да", "ок", "окей", "ok", "okay", "yes", "go"];

// Stems, so inflected forms agree too ("готова", "согласна").
const CONFIRM_STEMS: &[&str] = &["готов", "согласен", "согласн"];

/// Whether any word of the answer agrees ("да", "готова", "ok!")
pub fn is_confirmation(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|word| {
            CONFIRM_WORDS.contains(&word) || CONFIRM_STEMS.iter().any(|s| word.starts_with(s))
        })
}
