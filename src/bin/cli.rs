use clap::{Parser, Subcommand};
use enrollment_planner::{
    Course, Planner, PlannerConfig, PlannerError, ScheduleGrid, StoreKind, ingest,
    parse_slot_group,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "planner", about = "Course enrollment planner")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Course CSV to load
    #[arg(long, short = 'c')]
    csv: Option<PathBuf>,

    /// Where selected course names are saved
    #[arg(long, short = 's')]
    selections: Option<PathBuf>,

    /// Selection backend: json or sqlite
    #[arg(long)]
    store: Option<String>,

    /// Log at debug level
    #[arg(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a raw spreadsheet export into the planner's course CSV
    Format { input: PathBuf, output: PathBuf },
}

const NAME_WIDTH: usize = 36;
const INSTRUCTOR_WIDTH: usize = 16;
const ORGANIZATION_WIDTH: usize = 11;

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        let mut out: String = value.chars().take(max_chars - 1).collect();
        out.push('…');
        out
    } else {
        value.to_string()
    }
}

fn render_text_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if ci < widths.len() && len > widths[ci] {
                widths[ci] = len;
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, cells: &[String]| {
        out.push('|');
        for (ci, w) in widths.iter().enumerate() {
            let s = cells.get(ci).map(String::as_str).unwrap_or("");
            out.push(' ');
            out.push_str(s);
            let pad = w.saturating_sub(s.chars().count());
            if pad > 0 {
                out.push_str(&" ".repeat(pad));
            }
            out.push(' ');
            out.push('|');
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, headers);
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn course_table(courses: &[&Course]) -> String {
    let headers: Vec<String> = [
        "#", "Org", "Code", "Section", "Course", "Instructor", "Schedule", "Status",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let rows: Vec<Vec<String>> = courses
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            vec![
                (idx + 1).to_string(),
                truncate(&c.organization, ORGANIZATION_WIDTH),
                c.code.clone(),
                c.section.clone(),
                truncate(&c.name, NAME_WIDTH),
                truncate(&c.instructor, INSTRUCTOR_WIDTH),
                c.schedule.clone(),
                c.status().as_str().to_string(),
            ]
        })
        .collect();
    render_text_table(&headers, &rows)
}

fn print_courses(title: &str, courses: &[&Course]) {
    if courses.is_empty() {
        println!("No results for: {title}");
        return;
    }
    println!("\n{title}");
    println!("{}", "-".repeat(title.chars().count()));
    print!("{}", course_table(courses));
}

fn print_grid(planner: &Planner) {
    let grid = ScheduleGrid::build(planner.courses());
    print!("{}", render_text_table(&grid.header(), &grid.text_rows()));
}

fn print_help() {
    println!(
        "Commands:\n  help                          Show this help\n  list                          List all courses by name\n  selected                      List selected courses\n  search code <code>            Find sections by course code\n  search name <words...>        Find courses by similar name\n  search time <code>            Find courses fitting a time code (e.g. 2M123)\n  add code <code> [n]           Add a course (n picks a section when several match)\n  add name <words...>           Add the course matching a name\n  remove code <code> [n]        Remove a selected course\n  schedule                      Show selected courses and the weekly grid\n  format <raw> <out>            Convert a raw spreadsheet export into a course CSV\n  quit|exit                     Exit"
    );
}

/// Picks one id out of several matches, using the optional 1-based index.
/// Prints the candidates and returns `None` when the choice is ambiguous.
fn choose(ids: &[usize], index: Option<&str>, planner: &Planner, title: &str, hint: &str) -> Option<usize> {
    match index {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=ids.len()).contains(&n) => Some(ids[n - 1]),
            _ => {
                println!("Invalid index '{raw}': expected a number from 1 to {}.", ids.len());
                None
            }
        },
        None if ids.len() == 1 => Some(ids[0]),
        None => {
            let courses: Vec<&Course> = ids.iter().filter_map(|id| planner.course(*id)).collect();
            println!("Found {} matches.", ids.len());
            print_courses(title, &courses);
            println!("\n{hint}");
            None
        }
    }
}

fn add(planner: &mut Planner, id: usize) {
    match planner.add_course(id) {
        Ok(()) => {
            if let Some(course) = planner.course(id) {
                println!("'{}' ({}) added to the schedule.", course.name, course.code);
            }
        }
        Err(PlannerError::Conflicts(report)) => {
            for line in report.describe(planner.courses()) {
                println!("{line}");
            }
            println!("Cannot add course because of schedule conflicts.");
        }
        Err(e) => println!("Error: {e}"),
    }
}

fn remove(planner: &mut Planner, id: usize) {
    match planner.remove_course(id) {
        Ok(()) => {
            if let Some(course) = planner.course(id) {
                println!("'{}' ({}) removed from the schedule.", course.name, course.code);
            }
        }
        Err(e) => println!("Error: {e}"),
    }
}

fn handle_search<'a>(planner: &Planner, mut parts: impl Iterator<Item = &'a str>) {
    match parts.next() {
        Some("code") => match parts.next() {
            Some(code) => print_courses(
                &format!("Courses with code {code}"),
                &planner.find_by_code(code),
            ),
            None => println!("Usage: search code <code>"),
        },
        Some("name") => {
            let query = parts.collect::<Vec<_>>().join(" ");
            if query.is_empty() {
                println!("Usage: search name <words...>");
                return;
            }
            let hits: Vec<&Course> = planner.fuzzy_search(&query).iter().map(|h| h.course).collect();
            print_courses(&format!("Courses with names similar to '{query}'"), &hits);
        }
        Some("time") => match parts.next() {
            Some(token) => match planner.find_by_time_code(token) {
                Ok(courses) => {
                    let title = match parse_slot_group(token) {
                        Ok(group) => format!(
                            "Courses available on {} ({}) at: {}",
                            enrollment_planner::slot::day_name(group.day).unwrap_or("?"),
                            group.period.display_name(),
                            group.display_hours().join(", ")
                        ),
                        Err(_) => format!("Courses available at {token}"),
                    };
                    print_courses(&title, &courses);
                }
                Err(e) => println!("Error: {e}"),
            },
            None => println!("Usage: search time <code>"),
        },
        _ => println!("Usage: search code|name|time <query>"),
    }
}

fn handle_add<'a>(planner: &mut Planner, mut parts: impl Iterator<Item = &'a str>) {
    match parts.next() {
        Some("code") => {
            let Some(code) = parts.next() else {
                println!("Usage: add code <code> [n]");
                return;
            };
            let ids: Vec<usize> = planner.find_by_code(code).iter().map(|c| c.id).collect();
            if ids.is_empty() {
                println!("No course found with code {code}.");
                return;
            }
            let hint = format!("Pick a section with 'add code {code} <n>'.");
            if let Some(id) = choose(&ids, parts.next(), planner, &format!("Sections for {code}"), &hint) {
                add(planner, id);
            }
        }
        Some("name") => {
            let query = parts.collect::<Vec<_>>().join(" ");
            if query.is_empty() {
                println!("Usage: add name <words...>");
                return;
            }
            let ids: Vec<usize> = planner.fuzzy_search(&query).iter().map(|h| h.course.id).collect();
            if ids.is_empty() {
                println!("No course found with a name similar to '{query}'.");
                return;
            }
            let title = format!("Courses with names similar to '{query}'");
            if let Some(id) = choose(&ids, None, planner, &title, "Use 'add code <code>' to pick one.") {
                add(planner, id);
            }
        }
        _ => println!("Usage: add code <code> [n] | add name <words...>"),
    }
}

fn handle_remove<'a>(planner: &mut Planner, mut parts: impl Iterator<Item = &'a str>) {
    match (parts.next(), parts.next()) {
        (Some("code"), Some(code)) => {
            let ids: Vec<usize> = planner
                .find_by_code(code)
                .iter()
                .filter(|c| c.selected)
                .map(|c| c.id)
                .collect();
            if ids.is_empty() {
                println!("No selected course with code {code}.");
                return;
            }
            let hint = format!("Pick a section with 'remove code {code} <n>'.");
            let title = format!("Selected sections for {code}");
            if let Some(id) = choose(&ids, parts.next(), planner, &title, &hint) {
                remove(planner, id);
            }
        }
        _ => println!("Usage: remove code <code> [n]"),
    }
}

fn handle_format<'a>(mut parts: impl Iterator<Item = &'a str>) {
    let (Some(input), Some(output)) = (parts.next(), parts.next()) else {
        println!("Usage: format <raw> <out>");
        return;
    };
    match ingest::format_raw_csv(input, output) {
        Ok(count) => println!("Wrote {count} courses to {output}."),
        Err(e) => println!("Error formatting {input}: {e}"),
    }
}

fn handle_schedule(planner: &Planner) {
    let selected = planner.selected_courses();
    if selected.is_empty() {
        println!("No courses selected.");
        return;
    }
    print_courses("Selected courses", &selected);
    println!("\nWeekly schedule:");
    print_grid(planner);
}

fn build_config(cli: &Cli) -> Result<PlannerConfig, String> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_json_file(path)
            .map_err(|e| format!("Could not read config {}: {e}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if let Some(csv) = &cli.csv {
        config.source_path = csv.clone();
    }
    if let Some(selections) = &cli.selections {
        config.selections_path = Some(selections.clone());
    }
    if let Some(store) = &cli.store {
        config.store = StoreKind::from_str(store)
            .ok_or_else(|| format!("Unknown store '{store}': use json or sqlite"))?;
    }
    if cli.verbose {
        config.log_filter = "debug".to_string();
    }
    Ok(config)
}

fn init_logging(config: &PlannerConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            process::exit(2);
        }
    };
    init_logging(&config, cli.verbose);

    if let Some(Commands::Format { input, output }) = &cli.command {
        match ingest::format_raw_csv(input, output) {
            Ok(count) => println!("Wrote {count} courses to {}.", output.display()),
            Err(e) => {
                eprintln!("Error formatting {}: {e}", input.display());
                process::exit(1);
            }
        }
        return;
    }

    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Could not open selection store: {e}");
            process::exit(1);
        }
    };
    let mut planner = match Planner::load(&config.source_path, store) {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    println!(
        "Enrollment planner - {} courses loaded, {} selected. Type 'help' for commands.",
        planner.courses().len(),
        planner.selected_courses().len()
    );

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "list" => print_courses("All courses", &planner.courses_by_name()),
            "selected" => print_courses("Selected courses", &planner.selected_courses()),
            "search" => handle_search(&planner, parts),
            "add" => handle_add(&mut planner, parts),
            "remove" => handle_remove(&mut planner, parts),
            "schedule" => handle_schedule(&planner),
            "format" => handle_format(parts),
            other => {
                println!("Unknown command '{other}'. Type 'help' for commands.");
            }
        }
    }
}
