//! Result Rendering
//!
//! Turns a [`SimulationResult`] into the motivational message sent to the user.

use std::borrow::Cow;

use rust_decimal::{Decimal, RoundingStrategy};

use super::parse::Currency;
use crate::catalog;
use crate::model::{SimulationOutcome, SimulationResult};

/// Insert a space every three digits of an unsigned integer string
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Format a money amount: whole numbers without decimals, otherwise two
/// decimals, thousands separated by spaces, currency code appended.
pub fn format_currency(amount: f64, currency: Currency) -> String {
    let Some(value) = Decimal::from_f64_retain(amount) else {
        return format!("{amount} {currency}");
    };

    let whole_number = value.fract().is_zero();
    let rounded = if whole_number {
        value.trunc()
    } else {
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    };

    let text = if whole_number {
        rounded.abs().to_string()
    } else {
        format!("{:.2}", rounded.abs())
    };
    let (whole, fraction) = text
        .split_once('.')
        .map_or((text.as_str(), None), |(w, f)| (w, Some(f)));

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let grouped = group_thousands(whole);
    match fraction {
        Some(f) => format!("{sign}{grouped}.{f} {currency}"),
        None => format!("{sign}{grouped} {currency}"),
    }
}

/// Two decimals and a percent sign
pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

/// How a habit is named in the message, plus a joke about it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HabitProfile<'a> {
    /// "Вместо {accusative}"
    pub accusative: Cow<'a, str>,
    /// "потратить ... {prepositional}"
    pub prepositional: Cow<'a, str>,
    pub joke: &'static str,
}

const KNOWN_HABITS: &[(&str, &str, &str, &str)] = &[
    (
        "сигареты",
        "сигареты",
        "на сигареты",
        "Мог бы дышать полной грудью и купить себе яхту!",
    ),
    ("кофе", "кофе", "на кофе", "Мог бы открыть свою кофейню!"),
    (
        "алкоголь",
        "алкоголь",
        "на алкоголь",
        "Мог бы купить виноградник и пить только своё!",
    ),
    (
        "девочки",
        "девочек",
        "на девочек",
        "Мог бы купить себе остров и пригласить всех!",
    ),
    ("фастфуд", "фастфуд", "на фастфуд", "Мог бы открыть свою бургерную!"),
    (
        "сладкое",
        "сладкое",
        "на сладкое",
        "Мог бы построить шоколадную фабрику!",
    ),
];

impl<'a> HabitProfile<'a> {
    /// Profile of the first known habit mentioned in `habit`, else a generic one
    pub fn for_habit(habit: &'a str) -> Self {
        let lowered = habit.to_lowercase();
        KNOWN_HABITS
            .iter()
            .find(|(key, ..)| lowered.contains(key))
            .map_or_else(
                || Self {
                    accusative: Cow::Borrowed(habit),
                    prepositional: Cow::Owned(format!("на {habit}")),
                    joke: "Мог бы инвестировать с умом!",
                },
                |&(_, accusative, prepositional, joke)| Self {
                    accusative: Cow::Borrowed(accusative),
                    prepositional: Cow::Borrowed(prepositional),
                    joke,
                },
            )
    }
}

pub fn year_joke(year: i32) -> String {
    if year < 2000 {
        format!("С {year} года ты мог бы стать легендой инвестиций!")
    } else if year < 2010 {
        format!("С {year} года ты бы уже мог купить квартиру!")
    } else {
        format!("С {year} года ты мог бы накопить на мечту!")
    }
}

/// Answers the message is built from
#[derive(Clone, Copy, Debug)]
pub struct Answers<'a> {
    pub symbol: &'a str,
    pub habit: &'a str,
    pub year: i32,
    pub daily_spend: f64,
    pub currency: Currency,
}

const DISCLAIMER: &str = "*Все цифры примерные, расчёт основан только на динамике актива, \
без учёта валютных колебаний.*";

const APPROXIMATE_NOTE: &str = "⚠️ Помесячной истории цен не нашлось, поэтому итог оценён \
по цене на начало и конец периода.";

/// Final message for a finished questionnaire
pub fn final_message(answers: &Answers<'_>, result: &SimulationResult) -> String {
    let Answers {
        symbol,
        habit,
        year,
        daily_spend,
        currency,
    } = *answers;
    let profile = HabitProfile::for_habit(habit);

    let Some(total_value) = result.total_value else {
        return failure_message(answers, &profile, result.total_invested);
    };

    // Whole units, as the user sees them.
    let total_invested = result.total_invested.trunc();
    let total_value = total_value.trunc();
    let missed_profit = total_value - total_invested;
    let profit_percent = result.profit_percent.unwrap_or_default();

    let mut message = format!(
        "💡 {symbol} ({description})\n\n\
         🚬 Вместо {acc} ты мог бы инвестировать {daily} в день в {symbol} с {year} года.\n\
         💰 Сегодня у тебя было бы: {value}!\n\n\
         🔥 Вместо того чтобы потратить {invested} {prep}, ты мог бы заработать +{missed}!\n\
         📈 Это целых {profit_percent:.1}% прибыли!\n\n\
         ❗️ Не упусти возможность увеличить свой капитал! {joke} {year_joke}\n\n\
         🤓 Если хочешь быть умнее, чем ты был в {year}, углубись в инвестиции!\n\n\
         🚨 У тебя есть вредные привычки, которые съедают твои деньги. Пора задуматься!\n\n",
        description = catalog::describe(symbol),
        acc = profile.accusative,
        daily = format_currency(daily_spend, currency),
        value = format_currency(total_value, currency),
        invested = format_currency(total_invested, currency),
        prep = profile.prepositional,
        missed = format_currency(missed_profit, currency),
        joke = profile.joke,
        year_joke = year_joke(year),
    );

    if result.outcome() == SimulationOutcome::Fallback {
        message.push_str(APPROXIMATE_NOTE);
        message.push_str("\n\n");
    }
    message.push_str(DISCLAIMER);
    message
}

fn failure_message(answers: &Answers<'_>, profile: &HabitProfile<'_>, total_invested: f64) -> String {
    format!(
        "😔 Не получилось загрузить котировки {symbol}, так что без точных цифр.\n\n\
         Но вот что известно наверняка: с {year} года ты потратил примерно {spent} {prep}.\n\
         {joke} {year_joke}\n\n\
         Попробуй ещё раз чуть позже, напиши /start.",
        symbol = answers.symbol,
        year = answers.year,
        spent = format_currency(total_invested.trunc(), answers.currency),
        prep = profile.prepositional,
        joke = profile.joke,
        year_joke = year_joke(answers.year),
    )
}
