use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML config; built-in defaults are used if it is absent.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search instruments by name, then fetch quotes for every hit.
    Search { query: String },

    /// Fetch quotes; each argument is one comma-separated id list, all run concurrently.
    Quote {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Fetch market data for symbolic keys, e.g. INDEX_DAX CUR_EUR_USD.
    Market {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print the extRefId registered for a symbolic market data key.
    Resolve { key: String },

    /// List every symbolic market data key.
    Keys,

    /// Fetch chart prices: 0 intraday, 1 month, 2 three months, 3 year, 4 three years.
    Chart { ext_ref_id: String, chart_type: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_lists() {
        let cli = Cli::parse_from(["watchlist", "quote", "42,7", "11876"]);
        match cli.command {
            Commands::Quote { ids } => assert_eq!(ids, vec!["42,7", "11876"]),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn market_requires_a_key() {
        assert!(Cli::try_parse_from(["watchlist", "market"]).is_err());
    }

    #[test]
    fn chart_type_is_numeric() {
        let cli = Cli::parse_from(["watchlist", "--config", "x.toml", "chart", "42", "3"]);
        assert_eq!(cli.config, "x.toml");
        assert!(matches!(
            cli.command,
            Commands::Chart { chart_type: 3, .. }
        ));
    }
}
