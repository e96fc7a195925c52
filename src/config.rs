//! Runtime configuration for the `quiz-server` binary.
//!
//! Every setting can come from a flag or an environment variable; flags win.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::cache::DEFAULT_TTL;

#[derive(Parser, Debug, Clone)]
#[command(name = "quiz-server")]
#[command(about = "Multiple-choice quiz API with a read-through response cache", long_about = None)]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "QUIZ_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// Question database, e.g. `sqlite:quiz.db` or `sqlite::memory:`
    #[arg(long, env = "QUIZ_DATABASE_URL", default_value = "sqlite:quiz.db")]
    pub database_url: String,

    /// Cache backend: `memory://`, or `redis://host:port` when built with the `redis` feature
    #[arg(long, env = "QUIZ_CACHE_URL", default_value = "memory://")]
    pub cache_url: String,

    /// Seconds a cached response stays fresh
    #[arg(long, env = "QUIZ_CACHE_TTL_SECS", default_value_t = DEFAULT_TTL.as_secs())]
    pub cache_ttl_secs: u64,

    /// JSON file of questions loaded into an empty database at startup (same shape as `POST /questions`)
    #[arg(long, env = "QUIZ_SEED")]
    pub seed: Option<PathBuf>,
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["quiz-server"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:5000");
        assert_eq!(config.database_url, "sqlite:quiz.db");
        assert_eq!(config.cache_url, "memory://");
        assert_eq!(config.cache_ttl(), Duration::from_secs(10));
        assert!(config.seed.is_none());
    }

    #[test]
    fn flags_override() {
        let config = Config::try_parse_from([
            "quiz-server",
            "--bind",
            "0.0.0.0:8080",
            "--database-url",
            "sqlite:///var/lib/quiz/quiz.db",
            "--cache-url",
            "redis://cache:6379",
            "--cache-ttl-secs",
            "30",
            "--seed",
            "questions.json",
        ])
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.database_url, "sqlite:///var/lib/quiz/quiz.db");
        assert_eq!(config.cache_url, "redis://cache:6379");
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.seed, Some(PathBuf::from("questions.json")));
    }

    #[test]
    fn rejects_non_numeric_ttl() {
        assert!(Config::try_parse_from(["quiz-server", "--cache-ttl-secs", "soon"]).is_err());
    }
}
