//! Delivery tests against a scripted local relay

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::{EmailSender, EmailSenderConfig, MailError, SmtpEmailSender};

/// What the relay saw during one accepted message
#[derive(Debug, Clone, Default)]
struct Delivery {
    commands: Vec<String>,
    data: String,
}

struct TestRelay {
    port: u16,
    connections: Arc<AtomicUsize>,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl TestRelay {
    async fn start(accept_auth: bool) -> Self {
        Self::spawn(true, accept_auth).await
    }

    /// A relay whose EHLO reply has no `AUTH` capability
    async fn start_open() -> Self {
        Self::spawn(false, false).await
    }

    async fn spawn(advertise_auth: bool, accept_auth: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let deliveries = Arc::new(Mutex::new(Vec::new()));

        let accepted = connections.clone();
        let store = deliveries.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let store = store.clone();
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut lines = BufReader::new(read);
                    let mut delivery = Delivery::default();
                    let mut in_data = false;

                    write.write_all(b"220 localhost ESMTP test\r\n").await.unwrap();

                    loop {
                        let mut line = String::new();
                        if lines.read_line(&mut line).await.unwrap_or(0) == 0 {
                            break;
                        }

                        if in_data {
                            if line == ".\r\n" {
                                in_data = false;
                                store.lock().unwrap().push(delivery.clone());
                                write.write_all(b"250 2.0.0 Ok: queued\r\n").await.unwrap();
                            } else {
                                delivery.data.push_str(&line);
                            }
                            continue;
                        }

                        let command = line.trim_end().to_string();
                        delivery.commands.push(command.clone());
                        let verb = command.split(' ').next().unwrap_or("").to_ascii_uppercase();

                        let reply: &[u8] = match verb.as_str() {
                            "EHLO" if advertise_auth => {
                                b"250-localhost\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n"
                            }
                            "EHLO" => b"250-localhost\r\n250 8BITMIME\r\n",
                            "AUTH" if accept_auth => b"235 2.7.0 Authentication successful\r\n",
                            "AUTH" => b"535 5.7.8 Authentication credentials invalid\r\n",
                            "MAIL" | "RCPT" | "RSET" | "NOOP" => b"250 2.1.0 Ok\r\n",
                            "DATA" => {
                                in_data = true;
                                b"354 End data with <CR><LF>.<CR><LF>\r\n"
                            }
                            "QUIT" => {
                                let _ = write.write_all(b"221 2.0.0 Bye\r\n").await;
                                break;
                            }
                            _ => b"502 5.5.2 Command not recognized\r\n",
                        };
                        if write.write_all(reply).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self {
            port,
            connections,
            deliveries,
        }
    }

    fn sender(&self, user_name: &str, password: &str) -> SmtpEmailSender {
        SmtpEmailSender::new(EmailSenderConfig::new(
            "127.0.0.1",
            self.port,
            false,
            user_name,
            password,
            "noreply@example.com",
        ))
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

/// Generic over the trait the account flows use
async fn notify<S: EmailSender>(sender: &S, email: &str) -> Result<(), MailError> {
    sender
        .send_email(email, "Reset Password", "Please reset your password by <a href='https://localhost/reset'>clicking here</a>.")
        .await
}

#[tokio::test]
async fn test_send_delivers_one_html_message() {
    let relay = TestRelay::start(true).await;
    let sender = relay.sender("mailer", "secret");

    notify(&sender, "user@example.com").await.unwrap();

    assert_eq!(relay.connections(), 1);
    let deliveries = relay.deliveries();
    assert_eq!(deliveries.len(), 1);

    let delivery = &deliveries[0];
    assert!(delivery.commands.iter().any(|c| c.starts_with("AUTH PLAIN")));
    assert!(delivery.commands.iter().any(|c| c.starts_with("MAIL FROM:<noreply@example.com>")));
    assert!(delivery.commands.iter().any(|c| c.starts_with("RCPT TO:<user@example.com>")));
    assert!(delivery.data.contains("Subject: Reset Password"));
    assert!(delivery.data.contains("Content-Type: text/html"));
    assert!(delivery.data.contains("clicking here"));
}

#[tokio::test]
async fn test_blank_credentials_skip_auth_on_open_relay() {
    let relay = TestRelay::start_open().await;
    let sender = relay.sender("", "");

    notify(&sender, "user@example.com").await.unwrap();

    let deliveries = relay.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert!(!deliveries[0].commands.iter().any(|c| c.starts_with("AUTH")));
    assert!(deliveries[0].commands.iter().any(|c| c.starts_with("MAIL FROM:<noreply@example.com>")));
}

#[tokio::test]
async fn test_each_send_opens_its_own_session() {
    let relay = TestRelay::start(true).await;
    let sender = relay.sender("mailer", "secret");

    notify(&sender, "first@example.com").await.unwrap();
    notify(&sender, "second@example.com").await.unwrap();

    assert_eq!(relay.connections(), 2);
    assert_eq!(relay.deliveries().len(), 2);
}

#[tokio::test]
async fn test_rejected_credentials_fail_without_retry() {
    let relay = TestRelay::start(false).await;
    let sender = relay.sender("mailer", "wrong");

    let err = notify(&sender, "user@example.com").await.unwrap_err();

    assert!(matches!(err, MailError::Transport(_)));
    assert_eq!(err.kind(), kernel::error::kind::ErrorKind::ServiceUnavailable);
    assert_eq!(relay.connections(), 1);
    assert!(relay.deliveries().is_empty());
}

#[tokio::test]
async fn test_unreachable_relay() {
    // Bind and release a port so nothing is listening on it
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let sender = SmtpEmailSender::new(EmailSenderConfig::new(
        "127.0.0.1",
        port,
        false,
        "mailer",
        "secret",
        "noreply@example.com",
    ));

    let err = notify(&sender, "user@example.com").await.unwrap_err();
    assert!(matches!(err, MailError::Transport(_)));
}

#[tokio::test]
async fn test_malformed_recipient_never_connects() {
    let relay = TestRelay::start(true).await;
    let sender = relay.sender("mailer", "secret");

    let err = notify(&sender, "not an address").await.unwrap_err();

    assert!(matches!(err, MailError::InvalidAddress { .. }));
    assert_eq!(relay.connections(), 0);
}
