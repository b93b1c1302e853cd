use crate::analyzer::analyze_schedule;
use crate::error::{RosterError, RosterResult};
use crate::header::Month;
use crate::roster::RosterService;
use crate::types::{Category, RosterEntry};
use chrono::{NaiveDate, NaiveDateTime};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Format hours for display, dropping a trailing ".0"
fn format_hours(h: f64) -> String {
    format!("{:.1}", h).trim_end_matches(".0").to_string()
}

fn print_entries(entries: &[RosterEntry]) {
    for entry in entries {
        let time = entry
            .time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--:--".to_string());
        println!(
            "   {:<32} {:<8} {:<12} {}h  {}",
            entry.name.bright_blue(),
            format!("{:?}", entry.role).to_lowercase(),
            time,
            format_hours(entry.work_hours),
            entry.raw.dimmed()
        );
    }
}

/// Execute the schedule command
pub async fn schedule(
    service: &RosterService,
    name: &str,
    month: Month,
    division: &str,
    analyze: bool,
) -> RosterResult<()> {
    println!("{}", "📅 Roster - User Schedule".bold().green());
    println!("   Name:     {}", name);
    println!("   Month:    {}", month);
    println!("   Division: {}\n", division);

    let schedule = service.get_user_schedule(name, month, division).await?;
    if schedule.is_empty() {
        println!("{}", "⚠️  Nothing found".yellow());
        return Ok(());
    }

    for (label, text) in schedule.pairs() {
        println!("   {:<8} {}", label.cyan(), text);
    }
    println!();

    if analyze {
        let analysis = analyze_schedule(&schedule);
        println!("{}", "📊 Summary".bold());
        for category in Category::ALL {
            let days = analysis.bucket(category);
            if days.is_empty() {
                continue;
            }
            let labels: Vec<&str> = days.iter().map(|d| d.day.as_str()).collect();
            println!(
                "   {:<16} {:>2}  {}",
                category.as_str(),
                days.len(),
                labels.join(", ").dimmed()
            );
        }
        println!(
            "   {} {}h\n",
            "Total work hours:".bold(),
            format_hours(analysis.total_work_hours())
        );
    }

    Ok(())
}

/// Execute the duties command
pub async fn duties(
    service: &RosterService,
    date: NaiveDate,
    division: &str,
    whole_month: bool,
) -> RosterResult<()> {
    println!("{}", "🛡️  Roster - Duties".bold().green());
    println!("   Date:     {}", date);
    println!("   Division: {}\n", division);

    if whole_month {
        let month = service.get_duties_for_month(date, division).await?;
        if month.values().all(Vec::is_empty) {
            println!("{}", "⚠️  Nothing found".yellow());
            return Ok(());
        }
        for (day, entries) in &month {
            if entries.is_empty() {
                continue;
            }
            println!("{}", format!("   Day {}", day).bold());
            print_entries(entries);
        }
        println!();
        return Ok(());
    }

    let entries = service.get_duties_for_date(date, division).await?;
    if entries.is_empty() {
        println!("{}", "⚠️  Nothing found".yellow());
    } else {
        print_entries(&entries);
        println!();
    }
    Ok(())
}

/// Execute the heads command
pub async fn heads(service: &RosterService, date: NaiveDate, division: &str) -> RosterResult<()> {
    println!("{}", "👔 Roster - Heads on duty".bold().green());
    println!("   Date:     {}", date);
    println!("   Division: {}\n", division);

    let entries = service.get_heads_for_date(date, division).await?;
    if entries.is_empty() {
        println!("{}", "⚠️  Nothing found".yellow());
    } else {
        print_entries(&entries);
        println!();
    }
    Ok(())
}

/// Execute the group command
pub async fn group(
    service: &RosterService,
    head: &str,
    date: NaiveDate,
    division: &str,
) -> RosterResult<()> {
    println!("{}", "👥 Roster - Group".bold().green());
    println!("   Head:     {}", head);
    println!("   Date:     {}", date);
    println!("   Division: {}\n", division);

    let members = service.get_group_members(head, date, division).await?;
    if members.is_empty() {
        println!("{}", "⚠️  Nothing found".yellow());
    } else {
        print_entries(&members);
        println!();
    }
    Ok(())
}

/// Execute the active command
pub async fn active(
    service: &RosterService,
    at: NaiveDateTime,
    division: &str,
) -> RosterResult<()> {
    println!("{}", "⏱️  Roster - Active now".bold().green());
    println!("   At:       {}", at.format("%Y-%m-%d %H:%M"));
    println!("   Division: {}\n", division);

    let duties = service.active_duties(at, division).await?;
    let heads = service.active_heads(at, division).await?;

    println!("{}", "   Duties".bold());
    if duties.is_empty() {
        println!("   {}", "nobody".dimmed());
    } else {
        print_entries(&duties);
    }
    println!("{}", "   Heads".bold());
    if heads.is_empty() {
        println!("   {}", "nobody".dimmed());
    } else {
        print_entries(&heads);
    }
    println!();
    Ok(())
}

/// Execute the watch command
///
/// Invalidates the cache whenever one of the division's files changes and
/// reloads the schedule sheet so the next query is warm.
pub async fn watch(service: &RosterService, division: &str, verbose: bool) -> RosterResult<()> {
    let division_config = service.config().division(division)?;
    let files: Vec<PathBuf> = division_config
        .files()
        .into_iter()
        .map(Path::to_path_buf)
        .collect();

    println!("{}", "👁️  Roster - Watch Mode".bold().green());
    println!("   Division: {}", division);
    for file in &files {
        println!("   Watching: {}", file.display());
    }
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<DebounceEventResult>();

    // Create a debouncer to avoid rapid-fire events during file uploads
    let mut debouncer = new_debouncer(Duration::from_millis(200), move |res| {
        let _ = tx.send(res);
    })
    .map_err(|e| RosterError::Config(format!("Failed to create file watcher: {}", e)))?;

    let mut dirs = HashSet::new();
    for file in &files {
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if dirs.insert(dir.to_path_buf()) {
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| {
                    RosterError::Config(format!("Failed to watch {}: {}", dir.display(), e))
                })?;
            if verbose {
                println!("   {} {}", "Watching directory:".cyan(), dir.display());
            }
        }
    }

    println!("{}", "🔄 Initial load...".cyan());
    run_warm(service, division).await;
    println!();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(Ok(events)) => {
                        let changed: Vec<&PathBuf> = files
                            .iter()
                            .filter(|file| {
                                events.iter().any(|event| {
                                    event.kind == DebouncedEventKind::Any && same_file(&event.path, file)
                                })
                            })
                            .collect();
                        if changed.is_empty() {
                            continue;
                        }
                        println!(
                            "\n{} {}",
                            "🔄 Change detected at".cyan(),
                            chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                        );
                        for file in changed {
                            let removed = service.invalidate(file);
                            println!("   {} {} ({} cached sheets dropped)", "♻️".cyan(), file.display(), removed);
                        }
                        run_warm(service, division).await;
                        println!();
                    }
                    Some(Err(error)) => {
                        eprintln!("{} Watch error: {}", "❌".red(), error);
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", "👋 Watch stopped".cyan());
                break;
            }
        }
    }

    Ok(())
}

/// Whether a watcher event path refers to a configured file.
fn same_file(event_path: &Path, file: &Path) -> bool {
    match (event_path.canonicalize(), file.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => event_path.file_name().is_some() && event_path.file_name() == file.file_name(),
    }
}

async fn run_warm(service: &RosterService, division: &str) {
    match service.warm(division).await {
        Ok(people) => println!("{} {} people indexed", "✅ Schedule loaded:".bold().green(), people),
        Err(e) => println!("{} {}", "❌ Load failed:".bold().red(), e),
    }
}
