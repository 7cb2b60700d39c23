use chrono::NaiveDate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::errors::GenerationError;
use crate::harvest;
use crate::settings::{Settings, LANGUAGES, SOIL_TYPES, WATER_CONDITIONS};
use crate::transcript::{ChatTurn, Transcript};

const HISTORY_PREVIEW_CHARS: usize = 30;

pub fn print_banner(settings: &Settings) {
    println!("\n{}", "AGRO NOVA".green().bold());
    println!("Your AI farming tool for {}", settings.location.region.bold());
    println!("{}", "Type a question, or /help for commands.".dimmed());
}

pub fn print_help() {
    println!("\n{}", "Commands".bold());
    for (cmd, what) in [
        ("/history", "list past questions, newest first"),
        ("/delete N", "delete entry N of /history"),
        ("/image PATH", "attach a png/jpg to the next question"),
        ("/set KEY=VALUE", "change a setting (country, region, soil, water, crop, language, sowing_date, name, api_key)"),
        ("/profile", "show farm profile and harvest countdown"),
        ("/prompts", "suggested questions for your area"),
        ("/pick N", "ask suggestion N"),
        ("/tips", "ask for farming tips for your region"),
        ("/quit", "leave"),
    ] {
        println!("  {:<16} {}", cmd.cyan(), what);
    }
    println!();
}

pub fn print_turn(turn: &ChatTurn) {
    println!("\n{} {}", "you:".bold(), turn.query);
    println!("{} {}\n", "agronova:".green().bold(), turn.response);
}

pub fn print_error(err: &GenerationError) {
    eprintln!("{} {}", "warning:".yellow().bold(), err);
}

pub fn print_history(transcript: &Transcript) {
    println!("\n{}", "History".bold());
    if transcript.is_empty() {
        println!("(no questions yet)\n");
        return;
    }
    for (i, turn) in transcript.recent_first() {
        println!("{:>3}. {}", i + 1, preview(&turn.query, HISTORY_PREVIEW_CHARS));
    }
    println!();
}

pub fn print_prompts(prompts: &[String]) {
    println!("\n{}", "Personalized prompts for your area".bold());
    for (i, p) in prompts.iter().enumerate() {
        println!("{:>3}. {}", i + 1, p);
    }
    println!();
}

pub fn print_profile(settings: &Settings, today: NaiveDate) {
    let d = settings;
    println!("\n{}", d.name.bold());
    println!("  {} {}, {}", "Location:".bold(), d.location.region, d.location.country);
    println!("  {} {}{}", "Soil:".bold(), d.soil_type, unlisted(&d.soil_type, SOIL_TYPES));
    println!("  {} {}{}", "Water:".bold(), d.water_condition, unlisted(&d.water_condition, WATER_CONDITIONS));
    println!("  {} {}{}", "Language:".bold(), d.language, unlisted(&d.language, LANGUAGES));
    println!("  {} {}", "Crop:".bold(), d.crop);
    println!("  {} {}", "API key:".bold(), if d.credential.is_some() { "set in session" } else { "not set in session" });

    println!("\n{}", "Harvest countdown".bold());
    match d.sowing_date {
        None => println!("  set a sowing date with /set sowing_date=YYYY-MM-DD"),
        Some(sown) => match harvest::countdown(&d.crop, sown, today) {
            None => println!("  no growing period known for {}", d.crop),
            Some(c) => {
                println!("  {} days left ({})", c.days_remaining.to_string().green().bold(), d.crop);
                println!("  {} {:.0}%", progress_bar(c.progress, 20), c.progress * 100.0);
            }
        },
    }
    println!();
}

/// Spinner shown while a request is in flight.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        let ans = s.trim().to_lowercase();
        ans == "y" || ans == "yes"
    } else {
        false
    }
}

/// Next input line, or `None` at end of input.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt.green().bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s),
    }
}

/// First `max` characters of `text` on one line, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn unlisted(value: &str, known: &[&str]) -> &'static str {
    if known.contains(&value) {
        ""
    } else {
        " (custom)"
    }
}

fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0)) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_characters() {
        assert_eq!(preview("short", 30), "short");
        assert_eq!(preview("गेहूं की बुवाई कब करें", 5), "गेहूं...");
        assert_eq!(preview("line one\nline two", 30), "line one line two");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.375, 8), "[###-----]");
        assert_eq!(progress_bar(1.5, 4), "[####]");
        assert_eq!(progress_bar(0.0, 4), "[----]");
    }

    #[test]
    fn custom_values_are_marked() {
        assert_eq!(unlisted("Red Soil", SOIL_TYPES), "");
        assert_eq!(unlisted("Volcanic Ash", SOIL_TYPES), " (custom)");
    }
}
