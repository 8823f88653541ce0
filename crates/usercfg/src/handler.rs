//! Command handler for the settings shell

use std::fmt;
use std::sync::Arc;

use usercfg::{MemoryRepository, Settings, Theme};

/// Response to one command line
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Status(String),
    Value(String),
    Error(String),
    Quit,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "+{}", s),
            Reply::Value(v) => write!(f, "{}", v),
            Reply::Error(e) => write!(f, "-ERR {}", e),
            Reply::Quit => write!(f, "+BYE"),
        }
    }
}

pub struct CommandHandler {
    settings: Arc<Settings<MemoryRepository>>,
}

impl CommandHandler {
    pub fn new(settings: Arc<Settings<MemoryRepository>>) -> Self {
        Self { settings }
    }

    pub async fn handle(&self, line: &str) -> Reply {
        let mut parts = line.split_whitespace();
        let command = match parts.next() {
            Some(cmd) => cmd.to_uppercase(),
            None => return Reply::Error("empty command".to_string()),
        };
        let args: Vec<&str> = parts.collect();

        match command.as_str() {
            "PING" => Reply::Status("PONG".to_string()),
            "GET" => self.handle_get(&args).await,
            "CONFIG" => self.handle_config(&args).await,
            "SET" => self.handle_set(&args).await,
            "RESET" => self.handle_reset(&args).await,
            "THEMES" => self.handle_themes(),
            "KEYS" => self.handle_keys(),
            "PURGE" => self.handle_purge(&args),
            "FORGET" => self.handle_forget(&args),
            "USERS" => Reply::Value(self.settings.repository().len().to_string()),
            "FLUSH" => {
                self.settings.flush();
                Reply::Status("OK".to_string())
            }
            "STATS" => self.handle_stats(),
            "QUIT" | "EXIT" => Reply::Quit,
            _ => Reply::Error(format!("unknown command '{}'", command)),
        }
    }

    async fn handle_get(&self, args: &[&str]) -> Reply {
        let user_id = match parse_user(args, 1, "get") {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        match self.settings.theme_for(user_id).await {
            Ok(theme) => Reply::Value(theme.to_string()),
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    async fn handle_config(&self, args: &[&str]) -> Reply {
        let user_id = match parse_user(args, 1, "config") {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        let config = match self.settings.fetch_config(user_id).await {
            Ok(config) => config,
            Err(e) => return Reply::Error(e.to_string()),
        };
        match serde_json::to_string(&config) {
            Ok(json) => Reply::Value(json),
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    async fn handle_set(&self, args: &[&str]) -> Reply {
        let user_id = match parse_user(args, 2, "set") {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        let theme: Theme = match args[1].parse() {
            Ok(theme) => theme,
            Err(e) => return Reply::Error(e.to_string()),
        };

        match self.settings.set_theme(user_id, theme).await {
            Ok(config) => Reply::Status(format!("Set theme to {}", config.theme)),
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    async fn handle_reset(&self, args: &[&str]) -> Reply {
        let user_id = match parse_user(args, 1, "reset") {
            Ok(id) => id,
            Err(reply) => return reply,
        };

        match self.settings.reset_theme(user_id).await {
            Ok(()) => Reply::Status("OK".to_string()),
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    fn handle_themes(&self) -> Reply {
        let names: Vec<&str> = Theme::ALL.iter().map(|theme| theme.name()).collect();
        Reply::Value(names.join(" "))
    }

    fn handle_keys(&self) -> Reply {
        let keys = self.settings.cached_keys();
        if keys.is_empty() {
            return Reply::Value("(empty)".to_string());
        }
        Reply::Value(keys.join("\n"))
    }

    fn handle_purge(&self, args: &[&str]) -> Reply {
        if args.len() != 1 {
            return Reply::Error("wrong number of arguments for 'purge' command".to_string());
        }
        let removed = self.settings.forget_matching(args[0]);
        Reply::Value(removed.to_string())
    }

    fn handle_forget(&self, args: &[&str]) -> Reply {
        match parse_user(args, 1, "forget") {
            Ok(user_id) => Reply::Value(self.settings.forget_user(user_id).to_string()),
            Err(reply) => reply,
        }
    }

    fn handle_stats(&self) -> Reply {
        match serde_json::to_string(&self.settings.stats().snapshot()) {
            Ok(json) => Reply::Value(json),
            Err(e) => Reply::Error(e.to_string()),
        }
    }
}

fn parse_user(args: &[&str], expected: usize, command: &str) -> Result<u64, Reply> {
    if args.len() != expected {
        return Err(Reply::Error(format!(
            "wrong number of arguments for '{}' command",
            command
        )));
    }

    args[0]
        .parse()
        .map_err(|_| Reply::Error(format!("invalid user id '{}'", args[0])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use memocache::MemoConfig;

    fn handler() -> CommandHandler {
        let repo = Arc::new(MemoryRepository::new());
        let settings = Settings::new(repo, MemoConfig::default()).unwrap();
        CommandHandler::new(Arc::new(settings))
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let handler = handler();

        assert_eq!(handler.handle("get 5").await, Reply::Value("light".to_string()));
        assert_eq!(
            handler.handle("SET 5 Dark").await,
            Reply::Status("Set theme to dark".to_string())
        );
        assert_eq!(handler.handle("GET 5").await, Reply::Value("dark".to_string()));
    }

    #[tokio::test]
    async fn test_bad_input() {
        let handler = handler();

        assert!(matches!(handler.handle("").await, Reply::Error(_)));
        assert!(matches!(handler.handle("GET").await, Reply::Error(_)));
        assert!(matches!(handler.handle("GET abc").await, Reply::Error(_)));
        assert!(matches!(handler.handle("SET 1 sepia").await, Reply::Error(_)));
        assert!(matches!(handler.handle("NOPE").await, Reply::Error(_)));
    }

    #[tokio::test]
    async fn test_purge_and_keys() {
        let handler = handler();

        handler.handle("GET 1").await;
        handler.handle("GET 2").await;
        handler.handle("GET 10").await;

        assert_eq!(handler.handle("PURGE 1").await, Reply::Value("2".to_string()));
        match handler.handle("KEYS").await {
            Reply::Value(keys) => assert!(keys.ends_with(":2")),
            other => panic!("unexpected reply {:?}", other),
        }

        handler.handle("FLUSH").await;
        assert_eq!(handler.handle("KEYS").await, Reply::Value("(empty)".to_string()));
    }

    #[tokio::test]
    async fn test_stats_json() {
        let handler = handler();

        handler.handle("GET 1").await;
        handler.handle("GET 1").await;

        match handler.handle("STATS").await {
            Reply::Value(json) => {
                let stats: serde_json::Value = serde_json::from_str(&json).unwrap();
                assert_eq!(stats["hits"], 1);
                assert_eq!(stats["misses"], 1);
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_config_json_and_users() {
        let handler = handler();

        assert_eq!(handler.handle("CONFIG 3").await, Reply::Value("null".to_string()));
        assert_eq!(handler.handle("USERS").await, Reply::Value("0".to_string()));

        handler.handle("SET 3 dark").await;
        match handler.handle("config 3").await {
            Reply::Value(json) => {
                let config: serde_json::Value = serde_json::from_str(&json).unwrap();
                assert_eq!(config["id"], 3);
                assert_eq!(config["theme"], "dark");
            }
            other => panic!("unexpected reply {:?}", other),
        }
        assert_eq!(handler.handle("USERS").await, Reply::Value("1".to_string()));
        assert!(matches!(handler.handle("CONFIG").await, Reply::Error(_)));
    }

    #[tokio::test]
    async fn test_forget_single_user() {
        let handler = handler();

        handler.handle("GET 1").await;
        handler.handle("GET 10").await;

        assert_eq!(handler.handle("FORGET 1").await, Reply::Value("1".to_string()));
        assert_eq!(handler.handle("FORGET 1").await, Reply::Value("0".to_string()));
        match handler.handle("KEYS").await {
            Reply::Value(keys) => assert!(keys.ends_with(":10")),
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_reply_display() {
        assert_eq!(Reply::Status("OK".to_string()).to_string(), "+OK");
        assert_eq!(Reply::Error("bad".to_string()).to_string(), "-ERR bad");
    }
}
