use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::advisor::CannedAdvisor;
use crate::database::KeyValueStore;
use crate::error::PlannerError;
use crate::models::{MonthlyDataPatch, NewTask, Task, TaskId, tag_title};
use crate::planner::{Planner, Snapshot};
use crate::time;
use crate::utils::{get_current_date_string, get_current_year_month};

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Study planner - schedule time-boxed tasks, log your mood, review each month")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Schedule a new task
    AddTask {
        /// Task title
        title: String,
        /// Day of the task (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Start time (HH:MM, 24-hour)
        #[arg(long)]
        start: String,
        /// Length in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
        /// Task type, defaults to the configured default type
        #[arg(long = "type")]
        task_type: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Keep the title as typed instead of prefixing "[type]"
        #[arg(long)]
        no_tag: bool,
        /// Add even if the time overlaps another task
        #[arg(long)]
        force: bool,
    },
    /// Change fields of an existing task
    EditTask {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long = "type")]
        task_type: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Mark a task done, or not done again
    Toggle { id: TaskId },
    /// Delete a task
    Delete { id: TaskId },
    /// List tasks for a day or a month
    List {
        /// Day to list (YYYY-MM-DD), defaults to today
        #[arg(long, conflicts_with = "month")]
        date: Option<String>,
        /// Month to list (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Manage task types
    Types {
        #[command(subcommand)]
        command: TypesCommand,
    },
    /// Record or show daily mood feedback
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommand,
    },
    /// Edit or show monthly notes
    Month {
        #[command(subcommand)]
        command: MonthCommand,
    },
    /// Show monthly statistics
    Stats {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
    },
    /// Generate and store the monthly advisor report
    Report {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
    },
    /// Write a backup of all planner data
    Export {
        /// Output file, defaults to study-planner-backup-YYYYMMDD.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all planner data with a backup
    Import { path: PathBuf },
}

#[derive(Subcommand)]
pub enum TypesCommand {
    List,
    Add { label: String },
    Delete { label: String },
    /// Set the type preselected for new tasks
    Default { label: String },
}

#[derive(Subcommand)]
pub enum FeedbackCommand {
    Set {
        /// Day (YYYY-MM-DD)
        date: String,
        /// Mood score from 1 to 10
        score: u8,
        #[arg(default_value = "")]
        content: String,
    },
    Show { date: Option<String> },
}

#[derive(Subcommand)]
pub enum MonthCommand {
    Set {
        /// Month (YYYY-MM)
        month: String,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        memo: Option<String>,
        #[arg(long)]
        feedback: Option<String>,
    },
    Show { month: Option<String> },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Planner(#[from] PlannerError),
}

/// Run one parsed command against the planner
pub fn dispatch<S: KeyValueStore>(command: Commands, planner: &mut Planner<S>) -> Result<(), CliError> {
    match command {
        Commands::AddTask {
            title,
            date,
            start,
            duration,
            task_type,
            description,
            color,
            no_tag,
            force,
        } => {
            let task_type = task_type.unwrap_or_else(|| planner.default_task_type().to_string());
            let title = if no_tag { title } else { tag_title(&title, &task_type) };
            let mut candidate = NewTask::new(title, date.unwrap_or_else(get_current_date_string), start, duration)
                .with_type(task_type);
            if let Some(description) = description {
                candidate = candidate.with_description(description);
            }
            if let Some(color) = color {
                candidate = candidate.with_color(color);
            }
            handle_add_task(candidate, force, planner)
        }
        Commands::EditTask {
            id,
            title,
            date,
            start,
            duration,
            task_type,
            description,
            color,
        } => {
            let mut task = planner.get_task(id).cloned().ok_or(PlannerError::TaskNotFound(id))?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(date) = date {
                task.date = date;
            }
            if let Some(start) = start {
                task.start_time = start;
            }
            if let Some(duration) = duration {
                task.duration = duration;
            }
            if let Some(task_type) = task_type {
                task.task_type = task_type;
            }
            if let Some(description) = description {
                task.description = description;
            }
            if let Some(color) = color {
                task.color = color;
            }
            let task = planner.update_task(task)?;
            println!("Task updated: {}", format_task(&task));
            Ok(())
        }
        Commands::Toggle { id } => {
            match planner.toggle_task(id)? {
                Some(task) => println!("{}", format_task(&task)),
                None => println!("No task with ID {}", id),
            }
            Ok(())
        }
        Commands::Delete { id } => {
            if planner.delete_task(id)? {
                println!("Task {} deleted", id);
            } else {
                println!("No task with ID {}", id);
            }
            Ok(())
        }
        Commands::List { date, month } => {
            handle_list(date, month, planner);
            Ok(())
        }
        Commands::Types { command } => handle_types(command, planner),
        Commands::Feedback { command } => handle_feedback(command, planner),
        Commands::Month { command } => handle_month(command, planner),
        Commands::Stats { month } => {
            handle_stats(&month.unwrap_or_else(get_current_year_month), planner);
            Ok(())
        }
        Commands::Report { month } => {
            let month = month.unwrap_or_else(get_current_year_month);
            let report = planner.generate_report(&month, &CannedAdvisor)?;
            println!("{}", report);
            Ok(())
        }
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| {
                PathBuf::from(Snapshot::default_file_name(chrono::Local::now().date_naive()))
            });
            planner.write_backup(&path)?;
            println!("Backup written to {}", path.display());
            Ok(())
        }
        Commands::Import { path } => {
            planner.read_backup(&path)?;
            println!("Restored {} tasks from {}", planner.tasks().len(), path.display());
            Ok(())
        }
    }
}

/// Handle the add-task command
pub fn handle_add_task<S: KeyValueStore>(
    candidate: NewTask,
    force: bool,
    planner: &mut Planner<S>,
) -> Result<(), CliError> {
    let result = if force {
        planner.force_add_task(candidate)
    } else {
        planner.add_task(candidate)
    };

    match result {
        Ok(task) => {
            println!("Task created successfully (ID: {})", task.id);
            Ok(())
        }
        Err(err) => {
            if let Some(conflicts) = err.conflicts() {
                eprintln!("This time overlaps with:");
                for task in conflicts {
                    eprintln!("  {}", format_task(task));
                }
                eprintln!("Re-run with --force to add it anyway.");
            }
            Err(err.into())
        }
    }
}

fn handle_list<S: KeyValueStore>(date: Option<String>, month: Option<String>, planner: &Planner<S>) {
    let tasks = match month {
        Some(month) => {
            let mut tasks = planner.list_by_month_prefix(&month);
            tasks.sort_by(|a, b| (&a.date, &a.start_time).cmp(&(&b.date, &b.start_time)));
            tasks
        }
        None => planner.list_by_date(&date.unwrap_or_else(get_current_date_string)),
    };

    if tasks.is_empty() {
        println!("No tasks");
    }
    for task in &tasks {
        println!("{}", format_task(task));
    }
}

fn handle_types<S: KeyValueStore>(command: TypesCommand, planner: &mut Planner<S>) -> Result<(), CliError> {
    match command {
        TypesCommand::List => {
            for label in planner.task_types() {
                let marker = if label == planner.default_task_type() { "*" } else { " " };
                println!("{} {}", marker, label);
            }
        }
        TypesCommand::Add { label } => {
            if !planner.add_type(&label)? {
                println!("Type '{}' already exists", label.trim());
            }
        }
        TypesCommand::Delete { label } => {
            if !planner.delete_type(&label)? {
                println!("No type '{}'", label);
            }
        }
        TypesCommand::Default { label } => planner.set_default_type(&label)?,
    }
    Ok(())
}

fn handle_feedback<S: KeyValueStore>(command: FeedbackCommand, planner: &mut Planner<S>) -> Result<(), CliError> {
    match command {
        FeedbackCommand::Set { date, score, content } => {
            let feedback = planner.save_feedback(&date, score, &content)?;
            println!("{}: {} ({})", feedback.date, feedback.mood.as_str(), feedback.mood_score);
        }
        FeedbackCommand::Show { date } => {
            let date = date.unwrap_or_else(get_current_date_string);
            match planner.get_feedback(&date) {
                Some(feedback) => {
                    println!("{}: {} ({})", feedback.date, feedback.mood.as_str(), feedback.mood_score);
                    if !feedback.content.is_empty() {
                        println!("{}", feedback.content);
                    }
                }
                None => println!("No feedback for {}", date),
            }
        }
    }
    Ok(())
}

fn handle_month<S: KeyValueStore>(command: MonthCommand, planner: &mut Planner<S>) -> Result<(), CliError> {
    match command {
        MonthCommand::Set {
            month,
            keyword,
            memo,
            feedback,
        } => {
            planner.update_monthly_data(
                &month,
                MonthlyDataPatch {
                    keyword,
                    memo,
                    personal_feedback: feedback,
                    ai_report: None,
                },
            )?;
            println!("Saved notes for {}", month);
        }
        MonthCommand::Show { month } => {
            let month = month.unwrap_or_else(get_current_year_month);
            match planner.monthly_data(&month) {
                Some(data) => {
                    println!("Keyword:  {}", data.keyword);
                    println!("Memo:     {}", data.memo);
                    println!("Feedback: {}", data.personal_feedback);
                    if let Some(report) = &data.ai_report {
                        println!("\n{}", report);
                    }
                }
                None => println!("No notes for {}", month),
            }
        }
    }
    Ok(())
}

fn handle_stats<S: KeyValueStore>(month: &str, planner: &Planner<S>) {
    let summary = planner.monthly_summary(month);
    println!("{}", summary.year_month);
    println!("  Plans:        {}", summary.total_plans);
    println!("  Completed:    {}", summary.completed);
    println!("  Completion:   {:.1}%", summary.completion_rate);
    println!("  Average mood: {:.1}", summary.average_mood_score);
    for (label, count) in &summary.category_histogram {
        println!("  {:<12}  {}", label, count);
    }
}

fn format_task(task: &Task) -> String {
    let end = time::to_minutes(&task.start_time)
        .map(|start| {
            let end = (start as u64 + task.duration as u64) % time::MINUTES_PER_DAY as u64;
            time::format_minutes(end as u32)
        })
        .unwrap_or_else(|_| "?".to_string());
    format!(
        "[{}] {} {}-{} {} ({}) #{}",
        if task.is_completed { "x" } else { " " },
        task.date,
        task.start_time,
        end,
        task.display_title(),
        if task.task_type.is_empty() { "-" } else { task.task_type.as_str() },
        task.id
    )
}
