//! End-to-end tests: compose a message and deliver it to a scripted server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailcompose::{Attachment, Config, Credentials, Error, Mailer, Message, Security, send_mail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Accepts one session, answering every command with `250 OK` except
/// those listed in `replies`. Yields the commands and the message data.
async fn accept_all(
    ehlo: &'static str,
    replies: Vec<(&'static str, &'static str)>,
) -> (u16, JoinHandle<(Vec<String>, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        write.write_all(b"220 mock.example.com ESMTP\r\n").await.unwrap();

        let mut commands = Vec::new();
        let mut data = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let command = line.trim_end().to_string();
            let reply = if command.starts_with("EHLO") {
                ehlo
            } else if command == "DATA" {
                write.write_all(b"354 Go ahead\r\n").await.unwrap();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).await.unwrap();
                    if line == ".\r\n" {
                        break;
                    }
                    data.push_str(&line);
                }
                "250 2.0.0 Ok: queued as Q1"
            } else {
                replies
                    .iter()
                    .find(|(prefix, _)| command.starts_with(prefix))
                    .map_or("250 OK", |&(_, reply)| reply)
            };
            commands.push(command.clone());
            write.write_all(format!("{reply}\r\n").as_bytes()).await.unwrap();
            if command == "QUIT" {
                break;
            }
        }
        (commands, data)
    });

    (port, handle)
}

fn config(port: u16) -> Config {
    Config::builder("127.0.0.1")
        .port(port)
        .security(Security::None)
        .client_hostname("client.test")
        .io_timeout(Duration::from_secs(5))
        .build()
}

#[tokio::test]
async fn test_send_mail_delivers_composed_message() {
    init_tracing();
    let (port, server) = accept_all("250 mock.example.com", vec![]).await;

    let mut message = Message::new()
        .from("Sender <s@d.com>")
        .to("To <to@d.com>")
        .cc("cc@d.com")
        .bcc("hidden@d.com")
        .subject("Hello")
        .text_body("Hi");

    let reply = send_mail(&config(port), None, &mut message).await.unwrap();
    assert_eq!(reply.message_text(), "2.0.0 Ok: queued as Q1");

    let (commands, data) = server.await.unwrap();
    assert_eq!(
        commands,
        vec![
            "EHLO client.test",
            "MAIL FROM:<s@d.com>",
            "RCPT TO:<to@d.com>",
            "RCPT TO:<cc@d.com>",
            "RCPT TO:<hidden@d.com>",
            "DATA",
            "QUIT",
        ]
    );

    assert!(data.starts_with("From: Sender <s@d.com>\r\nTo: To <to@d.com>\r\nCc: cc@d.com\r\nSubject: Hello\r\n"));
    assert!(!data.contains("hidden@d.com"));
    assert!(data.contains(&format!("\r\n\r\n{}\r\n", STANDARD.encode("Hi"))));
}

#[tokio::test]
async fn test_mailer_authenticates_and_sends_attachment() {
    init_tracing();
    let (port, server) = accept_all(
        "250-mock.example.com\r\n250-SIZE 1000000\r\n250 AUTH PLAIN",
        vec![("AUTH PLAIN", "235 2.7.0 Authentication successful")],
    )
    .await;

    let mailer = Mailer::new(config(port)).credentials(Credentials::new("user", "pass"));
    let pdf = b"%PDF-1.4 not really a pdf".to_vec();
    let mut message = Message::new()
        .from("s@d.com")
        .to("r@d.com")
        .subject("Report")
        .text_body("See attached.")
        .attach(Attachment::from_bytes("report.pdf", pdf.clone()));

    mailer.send(&mut message).await.unwrap();

    let (commands, data) = server.await.unwrap();
    assert_eq!(commands[1], "AUTH PLAIN AHVzZXIAcGFzcw==");
    assert!(commands[2].starts_with("MAIL FROM:<s@d.com> SIZE="));
    assert!(data.contains("Content-Type: application/pdf"));
    assert!(data.contains("filename=\"report.pdf\""));
    assert!(data.contains(&STANDARD.encode(&pdf)));
}

#[tokio::test]
async fn test_rejected_sender_surfaces_smtp_error() {
    init_tracing();
    let (port, server) = accept_all(
        "250 mock.example.com",
        vec![("MAIL FROM", "553 5.7.1 Sender rejected")],
    )
    .await;

    let mut message = Message::new().from("s@d.com").to("r@d.com").text_body("Hi");
    let err = send_mail(&config(port), None, &mut message).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Smtp(mailcompose_smtp::Error::SmtpError { code: 553, .. })
    ));
    assert!(!err.is_transient());
    server.abort();
}

#[tokio::test]
async fn test_malformed_address_fails_before_connecting() {
    let mut message = Message::new()
        .from("s@d.com")
        .to("not an address")
        .text_body("Hi");

    let err = send_mail(&config(1), None, &mut message).await.unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        Error::Mime(mailcompose_mime::Error::InvalidAddress(_))
    ));
}
