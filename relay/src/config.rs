use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Pairs two mineblown players and relays their game events
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct RelayArgs {
    /// What log level to use
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,
}

impl RelayArgs {
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.verbose.log_level_filter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = RelayArgs::try_parse_from(["mineblown-relay"]).unwrap();
        assert_eq!(args.bind, "0.0.0.0");
        assert_eq!(args.log_level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn overrides() {
        let args = RelayArgs::try_parse_from(["mineblown-relay", "-b", "127.0.0.1", "--port", "8080", "-q"]).unwrap();
        assert_eq!((args.bind.as_str(), args.port), ("127.0.0.1", 8080));
        assert_eq!(args.log_level_filter(), log::LevelFilter::Warn);
    }
}
