use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fleetr_common::config::Config;
use fleetr_common::network::address::Address;
use fleetr_core::network::transport::{CommandOutput, Session, Transport, TransportError};

/// Canned reply for one (address, command) pair.
#[derive(Clone)]
pub enum Reply {
    Exit(i32),
    Refused,
    TimedOut,
    Broken(&'static str),
}

/// A transport answering from a table. Anything not in the table succeeds.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: HashMap<(Address, String), Reply>,
    delays: HashMap<Address, Duration>,
    calls: Mutex<Vec<(Address, String)>>,
}

impl ScriptedTransport {
    pub fn reply(mut self, address: &str, command: &str, reply: Reply) -> Self {
        self.replies
            .insert((addr(address), command.to_string()), reply);
        self
    }

    pub fn delay(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(addr(address), delay);
        self
    }

    pub fn calls(&self) -> Vec<(Address, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands_on(&self, address: &str) -> Vec<String> {
        let address = addr(address);
        self.calls()
            .into_iter()
            .filter(|(called, _)| *called == address)
            .map(|(_, command)| command)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exec(
        &self,
        session: &Session,
        command: &str,
        _exec_timeout: Option<Duration>,
    ) -> Result<CommandOutput, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((session.address, command.to_string()));

        if let Some(delay) = self.delays.get(&session.address) {
            tokio::time::sleep(*delay).await;
        }

        match self.replies.get(&(session.address, command.to_string())) {
            None => Ok(CommandOutput {
                stdout: format!("{command} on {}\n", session.address),
                stderr: String::new(),
                exit_code: 0,
            }),
            Some(Reply::Exit(code)) => Ok(CommandOutput {
                stdout: String::new(),
                stderr: "failed\n".to_string(),
                exit_code: *code,
            }),
            Some(Reply::Refused) => Err(TransportError::Connect(
                "ssh: connect to host: Connection refused".to_string(),
            )),
            Some(Reply::TimedOut) => Err(TransportError::Timeout(Duration::from_secs(1))),
            Some(Reply::Broken(cause)) => Err(TransportError::Session(cause.to_string())),
        }
    }
}

pub fn addr(address: &str) -> Address {
    address.parse().unwrap()
}

pub fn lenient() -> Config {
    Config::default()
}

/// A loopback port nobody listens on.
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
