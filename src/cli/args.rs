pub const ENV_EMAIL: &str = "COMMISSION_EMAIL";
pub const ENV_PASSWORD: &str = "COMMISSION_PASSWORD";
pub const ENV_TOKEN: &str = "COMMISSION_TOKEN";

/// Global flags; everything from the first non-flag word on is the command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub connect: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub timeout_ms: Option<String>,
    pub repl: bool,
    pub help: bool,
    pub command: Vec<String>,
}

impl CliArgs {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut out = CliArgs::default();
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let slot = match flag {
                "--connect" => &mut out.connect,
                "--email" | "-u" => &mut out.email,
                "--password" | "-p" => &mut out.password,
                "--token" => &mut out.token,
                "--timeout-ms" => &mut out.timeout_ms,
                "--repl" => { out.repl = true; i += 1; continue; }
                "-h" | "--help" => { out.help = true; i += 1; continue; }
                other if other.starts_with('-') => return Err(format!("Unrecognized argument: {}", other)),
                _ => {
                    out.command = args[i..].to_vec();
                    break;
                }
            };
            let Some(value) = args.get(i + 1) else {
                return Err(format!("{} requires a value", flag));
            };
            *slot = Some(value.clone());
            i += 2;
        }
        Ok(out)
    }

    /// Fill unset credentials from the environment.
    pub fn with_env_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.email = self.email.or_else(|| lookup(ENV_EMAIL));
        self.password = self.password.or_else(|| lookup(ENV_PASSWORD));
        self.token = self.token.or_else(|| lookup(ENV_TOKEN));
        self
    }
}

pub fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--connect <url>] [--email <e>] [--password <p>] [--token <t>] [--timeout-ms <ms>] <command>\n  {program} --repl [--connect <url>] [--email <e>] [--password <p>]\n\n\
Flags:\n  --connect <url>       Backend base URL (default from COMMISSION_API_URL, else http://localhost:3000)\n  --email <e>           Login email (or COMMISSION_EMAIL)\n  --password <p>        Login password (or COMMISSION_PASSWORD)\n  --token <t>           Resume a session with an existing bearer token (or COMMISSION_TOKEN)\n  --timeout-ms <ms>     Request timeout (default 10000)\n  --repl                Start interactive mode\n  -h, --help            Show this help\n\n\
Commands:\n{commands}",
        commands = super::commands::COMMAND_HELP
    );
}
