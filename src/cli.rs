use clap::Parser;

use crate::render::{Layout, MIN_TOTAL_WIDTH};

#[derive(Parser, Debug)]
#[command(
    name = "search-compare",
    version,
    about = "Compare a grounded LLM answer, semantic search, and keyword search for the same query"
)]
pub struct Cli {
    /// Query to run once. Without it, queries are read from stdin, one per line.
    pub query: Option<String>,

    #[arg(long, value_enum, default_value_t = Layout::Columns)]
    pub layout: Layout,

    /// Index to search (overrides SEARCH_INDEX)
    #[arg(long)]
    pub index: Option<String>,

    /// Hits per list
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=100))]
    pub size: u16,

    /// Total output width for the column layout
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u16).range(MIN_TOTAL_WIDTH as i64..))]
    pub width: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["search-compare"]).unwrap();
        assert!(cli.query.is_none());
        assert_eq!(cli.layout, Layout::Columns);
        assert_eq!(cli.size, 10);
        assert_eq!(cli.width, 120);
    }

    #[test]
    fn parses_query_and_options() {
        let cli = Cli::try_parse_from([
            "search-compare",
            "refund policy",
            "--layout",
            "tabs",
            "--index",
            "blog",
            "--size",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.query.as_deref(), Some("refund policy"));
        assert_eq!(cli.layout, Layout::Tabs);
        assert_eq!(cli.index.as_deref(), Some("blog"));
        assert_eq!(cli.size, 5);
    }

    #[test]
    fn rejects_out_of_range_size() {
        assert!(Cli::try_parse_from(["search-compare", "--size", "0"]).is_err());
        assert!(Cli::try_parse_from(["search-compare", "--size", "101"]).is_err());
        assert!(Cli::try_parse_from(["search-compare", "--width", "10"]).is_err());
    }

    #[test]
    fn width_floor_matches_column_layout() {
        assert!(Cli::try_parse_from(["search-compare", "--width", "60"]).is_err());
        assert!(Cli::try_parse_from(["search-compare", "--width", "65"]).is_err());
        let cli = Cli::try_parse_from(["search-compare", "--width", "66"]).unwrap();
        assert_eq!(usize::from(cli.width), MIN_TOTAL_WIDTH);
    }
}
