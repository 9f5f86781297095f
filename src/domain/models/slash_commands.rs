#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_stop()
            || cmd.is_retry()
            || cmd.is_undo()
            || cmd.is_clear()
            || cmd.is_login()
            || cmd.is_logout()
            || cmd.is_preview()
            || cmd.is_select()
            || cmd.is_tab()
            || cmd.is_close()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_stop(&self) -> bool {
        return ["/s", "/stop"].contains(&self.command.as_str());
    }

    pub fn is_retry(&self) -> bool {
        return ["/r", "/retry"].contains(&self.command.as_str());
    }

    pub fn is_undo(&self) -> bool {
        return ["/u", "/undo"].contains(&self.command.as_str());
    }

    pub fn is_clear(&self) -> bool {
        return ["/clear", "/new"].contains(&self.command.as_str());
    }

    pub fn is_login(&self) -> bool {
        return self.command == "/login" && !self.args.is_empty();
    }

    pub fn is_logout(&self) -> bool {
        return self.command == "/logout";
    }

    pub fn is_preview(&self) -> bool {
        return ["/p", "/preview"].contains(&self.command.as_str());
    }

    pub fn is_select(&self) -> bool {
        return self.command == "/select" && self.select_index().is_some();
    }

    pub fn is_tab(&self) -> bool {
        return self.command == "/tab" && self.args.len() == 1;
    }

    pub fn is_close(&self) -> bool {
        return self.command == "/close";
    }

    /// One-based message number passed to `/select`, converted to an index.
    pub fn select_index(&self) -> Option<usize> {
        return self
            .args
            .first()
            .and_then(|arg| return arg.parse::<usize>().ok())
            .filter(|n| return *n > 0)
            .map(|n| return n - 1);
    }
}
