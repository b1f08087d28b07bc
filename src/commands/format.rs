use kks_core::context::Context;
use kks_core::registry::Session;

/// One `session\t: client\t: dir` row per client; sessions without clients
/// get a single row with a blank client.
pub fn session_table(sessions: &[Session]) -> String {
    let mut table = String::new();
    for session in sessions {
        let dir = match (&session.dir, &session.error) {
            (_, Some(error)) => format!("({})", error),
            (Some(dir), None) => dir.clone(),
            (None, None) => String::new(),
        };

        if session.clients.is_empty() {
            table.push_str(&format!("{}\t:  \t: {}\n", session.name, dir));
        }
        for client in &session.clients {
            table.push_str(&format!("{}\t: {}\t: {}\n", session.name, client, dir));
        }
    }
    table
}

pub fn env_lines(context: &Context) -> String {
    format!("session: {}\nclient: {}\n", context.session, context.client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(name: &str, clients: &[&str], dir: Option<&str>, error: Option<&str>) -> Session {
        Session {
            name: name.to_string(),
            clients: clients.iter().map(|c| c.to_string()).collect(),
            dir: dir.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_session_table() {
        let sessions = vec![
            session("work", &["client0", "client1"], Some("/src/work"), None),
            session("idle", &[], Some("/tmp"), None),
            session("stuck", &[], None, Some("no response")),
        ];

        assert_eq!(
            session_table(&sessions),
            "work\t: client0\t: /src/work\n\
             work\t: client1\t: /src/work\n\
             idle\t:  \t: /tmp\n\
             stuck\t:  \t: (no response)\n"
        );
    }

    #[test]
    fn test_env_lines() {
        assert_eq!(
            env_lines(&Context::new("work", "client0")),
            "session: work\nclient: client0\n"
        );
    }
}
