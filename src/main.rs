use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use varredor::dashboard::{Dashboard, GroupMean, TopList, DEFAULT_TOP};
use varredor::report::Format;
use varredor::{catalog, Album, Catalog, Filter, RatingConfig};

#[derive(Parser, Debug)]
#[command(name = "varredor")]
#[command(author, version, about = "Explore progressive rock albums ranked by weighted rating")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// CSV file or directory of CSV files
    #[arg(env = "VARREDOR_CSV")]
    path: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    rating: RatingArgs,

    /// Output report file (.csv, .json, .html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "varredor-reports", env = "VARREDOR_REPORT_DIR")]
    report_dir: PathBuf,

    /// Don't auto-generate CSV report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open HTML reports
    #[arg(long)]
    no_open: bool,

    /// Rows to print (0 = all)
    #[arg(short, long, default_value = "25")]
    limit: usize,

    /// Length of top lists
    #[arg(long, default_value_t = DEFAULT_TOP)]
    top: usize,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log filter, e.g. "info" or "varredor=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start interactive web UI
    Serve {
        /// CSV file or directory of CSV files
        #[arg(env = "VARREDOR_CSV")]
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001", env = "VARREDOR_PORT")]
        port: u16,

        /// Don't open the browser
        #[arg(long)]
        no_open: bool,

        /// Length of top lists
        #[arg(long, default_value_t = DEFAULT_TOP)]
        top: usize,

        #[command(flatten)]
        rating: RatingArgs,
    },

    /// Print grouped statistics and top lists
    Stats {
        /// CSV file or directory of CSV files
        #[arg(env = "VARREDOR_CSV")]
        path: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        rating: RatingArgs,

        /// Length of top lists
        #[arg(long, default_value_t = DEFAULT_TOP)]
        top: usize,
    },

    /// Explain how an album's weighted rating was computed
    Inspect {
        /// Artist or album name (case-insensitive substring)
        query: String,

        /// CSV file or directory of CSV files
        #[arg(long, env = "VARREDOR_CSV")]
        path: PathBuf,

        #[command(flatten)]
        rating: RatingArgs,
    },
}

#[derive(ClapArgs, Debug, Clone, Default)]
struct FilterArgs {
    /// Only albums from this country
    #[arg(long)]
    country: Option<String>,

    /// Only albums of these styles (repeatable)
    #[arg(long = "style")]
    styles: Vec<String>,

    /// Only albums from these years (repeatable)
    #[arg(long = "year")]
    years: Vec<i32>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(ref country) = self.country {
            filter = filter.with_country(country.as_str());
        }
        for style in &self.styles {
            filter = filter.with_style(style.as_str());
        }
        for &year in &self.years {
            filter = filter.with_year(year);
        }
        filter
    }
}

#[derive(ClapArgs, Debug, Clone)]
struct RatingArgs {
    /// Quantile of vote counts used as the prior weight (0-1)
    #[arg(long, default_value = "0.75", value_parser = parse_quantile)]
    quantile: f64,
}

impl RatingArgs {
    fn config(&self) -> RatingConfig {
        RatingConfig::default().with_quantile(self.quantile)
    }
}

fn parse_quantile(s: &str) -> Result<f64, String> {
    let q: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&q) {
        Ok(q)
    } else {
        Err(format!("quantile must be between 0 and 1, got {}", q))
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = varredor::logging::init_tracing(args.verbose, args.log_level.as_deref(), args.log_json) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(args: Args) -> varredor::Result<i32> {
    // Handle subcommands first
    if let Some(cmd) = args.command {
        match cmd {
            Command::Serve { path, port, no_open, top, rating } => {
                let config = varredor::serve::ServeConfig {
                    port,
                    rating: rating.config(),
                    top,
                    open_browser: !no_open,
                };
                varredor::serve::start(path, config)?;
                return Ok(0);
            }
            Command::Stats { path, filter, rating, top } => {
                let catalog = catalog::load(&path, &rating.config())?;
                let dashboard = Dashboard::build(&catalog, &filter.to_filter(), top);
                print_stats(&dashboard);
                return Ok(0);
            }
            Command::Inspect { query, path, rating } => {
                let catalog = catalog::load(&path, &rating.config())?;
                return Ok(inspect(&catalog, &query));
            }
        }
    }

    let path = match args.path {
        Some(p) => p,
        None => {
            eprintln!("Usage: varredor <PATH>");
            eprintln!("Run 'varredor --help' for more options.");
            return Ok(2);
        }
    };

    let catalog = catalog::load(&path, &args.rating.config())?;
    let filter = args.filter.to_filter();
    let dashboard = Dashboard::build(&catalog, &filter, args.top);

    if !args.quiet {
        eprintln!("\x1b[1mVarredor Progressivo\x1b[0m");
        eprintln!("{}", "─".repeat(90));
        print_table(&dashboard, args.limit);
    }

    print_summary(&dashboard);

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        std::fs::create_dir_all(&args.report_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("varredor_report_{}.csv", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    if let Some(ref output_path) = report_path {
        varredor::report::generate(output_path, &dashboard)?;
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        // Only HTML is worth opening in a browser
        if Format::from_path(output_path) == Format::Html && !args.no_open && !args.quiet {
            eprint!("\nOpen report in browser? [Y/n] ");
            io::stderr().flush().ok();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_ok() {
                let input = input.trim().to_lowercase();
                if input.is_empty() || input == "y" || input == "yes" {
                    if let Err(e) = open::that(output_path) {
                        eprintln!("Failed to open report: {}", e);
                    }
                }
            }
        }
    }

    Ok(0)
}

fn weighted_color(album: &Album, global_mean: f64) -> &'static str {
    if album.weighted_rating == 0.0 {
        "\x1b[90m" // Gray: no data
    } else if album.weighted_rating >= global_mean + 0.3 {
        "\x1b[32m" // Green
    } else if album.weighted_rating >= global_mean - 0.3 {
        "\x1b[33m" // Yellow
    } else {
        "\x1b[31m" // Red
    }
}

fn print_table(dashboard: &Dashboard, limit: usize) {
    let reset = "\x1b[0m";
    let shown = if limit == 0 { dashboard.albums.len() } else { limit };

    println!(
        "{:>4}  {:>8}  {:>6}  {:>6}  {:>4}  {:<16}  {:<22}  {}",
        "#", "WEIGHTED", "RATING", "VOTES", "YEAR", "COUNTRY", "STYLE", "ALBUM"
    );
    for (i, a) in dashboard.albums.iter().take(shown).enumerate() {
        println!(
            "{:>4}  {}{:>8.3}{}  {:>6}  {:>6}  {:>4}  {:<16}  {:<22}  {}",
            i + 1,
            weighted_color(a, dashboard.summary.global_mean),
            a.weighted_rating,
            reset,
            a.rating.map(|r| format!("{:.2}", r)).unwrap_or_else(|| "-".to_string()),
            a.num_ratings.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            a.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
            truncate(a.country.as_deref().unwrap_or("-"), 16),
            truncate(a.style.as_deref().unwrap_or("-"), 22),
            a.display_name()
        );
    }
    if dashboard.albums.len() > shown {
        eprintln!("\x1b[90m... {} more (use --limit 0 to show all)\x1b[0m", dashboard.albums.len() - shown);
    }
}

fn print_summary(dashboard: &Dashboard) {
    let s = &dashboard.summary;
    eprintln!("\n{}", "─".repeat(90));
    eprintln!("\x1b[1mSummary:\x1b[0m");
    eprintln!("  Albums:        {}", s.total);
    eprintln!("  Rated:         {}", s.rated);
    eprintln!("  Shown:         {}", s.filtered);
    eprintln!("  Global mean:   {:.3}", s.global_mean);
    eprintln!("  Prior weight:  {:.1}", s.prior_weight);
}

fn print_groups(title: &str, groups: &[GroupMean]) {
    println!("\n\x1b[1m{}\x1b[0m", title);
    if groups.is_empty() {
        println!("  (none)");
    }
    for g in groups {
        println!(
            "  {:<32} {:>6}  {}",
            truncate(&g.group, 32),
            g.albums,
            g.mean.map(|m| format!("{:.3}", m)).unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_top(title: &str, list: &TopList) {
    println!("\n\x1b[1m{}: {}\x1b[0m", title, list.key);
    for (i, a) in list.albums.iter().enumerate() {
        println!(
            "  {:>2}. {:.3}  {} ({})",
            i + 1,
            a.weighted_rating,
            a.display_name(),
            a.year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string())
        );
    }
}

fn print_stats(dashboard: &Dashboard) {
    println!("\x1b[1mAlbums per country\x1b[0m");
    for c in &dashboard.country_counts {
        println!("  {:<32} {:>6}", truncate(&c.country, 32), c.count);
    }

    print_groups("Average rating by style", &dashboard.avg_rating_by_style);
    print_groups("Average weighted rating by country", &dashboard.avg_weighted_by_country);

    if let Some(ref list) = dashboard.top_by_style {
        print_top("Top by style", list);
    }
    if let Some(ref list) = dashboard.top_by_country {
        print_top("Top by country", list);
    }

    print_summary(dashboard);
}

fn inspect(catalog: &Catalog, query: &str) -> i32 {
    let matches = catalog.search(query);
    if matches.is_empty() {
        eprintln!("No album matches '{}'", query);
        return 1;
    }

    let prior = &catalog.prior;
    println!("Global mean (C):   {:.4}", prior.global_mean);
    println!("Prior weight (m):  {:.1}", prior.prior_weight);
    println!("Rated albums:      {}", prior.rated);

    for album in matches {
        let b = prior.explain(album);
        println!("\n{}", "=".repeat(60));
        println!("{}", album.display_name());
        println!("{}", "=".repeat(60));
        println!("  Votes (v):        {}", b.votes);
        println!(
            "  Rating (R):       {}",
            b.rating.map(|r| format!("{:.4}", r)).unwrap_or_else(|| "missing".to_string())
        );
        if b.own_share == 0.0 {
            println!("  No votes or no rating: weighted rating floors to 0");
        } else {
            println!("  v / (v + m):      {:.4}", b.own_share);
            println!("  m / (v + m):      {:.4}", 1.0 - b.own_share);
        }
        println!("  Weighted rating:  {:.4}", b.weighted_rating);
    }
    0
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantile_bounds() {
        assert_eq!(parse_quantile("0"), Ok(0.0));
        assert_eq!(parse_quantile("0.75"), Ok(0.75));
        assert_eq!(parse_quantile("1.0"), Ok(1.0));
        assert!(parse_quantile("-0.1").is_err());
        assert!(parse_quantile("1.01").is_err());
        assert!(parse_quantile("abc").unwrap_err().contains("abc"));
    }

    #[test]
    fn test_filter_args_to_filter() {
        let args = FilterArgs {
            country: Some("Italy".into()),
            styles: vec!["Zeuhl".into(), "RIO/Avant-Prog".into()],
            years: vec![1973, 1975],
        };
        let filter = args.to_filter();

        assert_eq!(filter.country.as_deref(), Some("Italy"));
        assert_eq!(filter.styles, vec!["Zeuhl", "RIO/Avant-Prog"]);
        assert_eq!(filter.years, vec![1973, 1975]);
    }

    #[test]
    fn test_filter_args_all_countries_is_no_filter() {
        let args = FilterArgs {
            country: Some("all".into()),
            ..Default::default()
        };
        assert!(args.to_filter().is_empty());
        assert!(FilterArgs::default().to_filter().is_empty());
    }

    #[test]
    fn test_cli_parses_quantile_and_filters() {
        let args = Args::try_parse_from([
            "varredor", "albums.csv", "--country", "France", "--style", "Zeuhl", "--quantile", "0.5",
        ])
        .unwrap();
        assert_eq!(args.rating.quantile, 0.5);
        assert_eq!(args.filter.to_filter().styles, vec!["Zeuhl"]);

        assert!(Args::try_parse_from(["varredor", "albums.csv", "--quantile", "2"]).is_err());
    }
}
