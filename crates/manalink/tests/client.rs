//! Integration tests for the client loop over an in-memory connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use manalink::prelude::*;
use manalink::protocol::opcodes::{cmsg, smsg};
use manalink::protocol::ProtocolError;
use manalink::session::SessionState;
use manalink::transport::{Connection, MemoryConnection};

// =========================================================================
// Helpers
// =========================================================================

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn variable(opcode: u16, body: &[u8]) -> Vec<u8> {
    let mut frame = opcode.to_le_bytes().to_vec();
    frame.extend_from_slice(&((body.len() + 4) as u16).to_le_bytes());
    frame.extend_from_slice(body);
    frame
}

fn player_chat(line: &str) -> Vec<u8> {
    variable(smsg::PLAYER_CHAT, line.as_bytes())
}

fn whisper_response(kind: u8) -> Vec<u8> {
    let mut frame = smsg::WHISPER_RESPONSE.to_le_bytes().to_vec();
    frame.push(kind);
    frame.extend_from_slice(&0i32.to_le_bytes());
    frame
}

fn client_with(
    builder: ClientBuilder,
) -> (Client<MemoryConnection>, MemoryConnection, Arc<RecordingSink>) {
    let (client_end, server_end) = MemoryConnection::pair();
    let sink = Arc::new(RecordingSink::new());
    let client = builder.chat_sink(sink.clone()).build(client_end);
    (client, server_end, sink)
}

fn alice() -> ClientBuilder {
    ClientBuilder::new().session(SessionConfig::new(ServerType::EAthena, "Alice"))
}

fn chat_lines(events: &[ChatEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ChatEvent::ChatLog { line, .. } => Some(line.clone()),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Incoming
// =========================================================================

#[tokio::test]
async fn test_client_frames_split_and_merged_chunks_in_order() {
    let (client, server, sink) = client_with(alice());

    let first = player_chat("Bob : one");
    let second = player_chat("Carol : two");
    let third = player_chat("Dave : three");
    let script = async move {
        // First frame split in two, then two frames in one chunk.
        server.send(&first[..3]).await.unwrap();
        server.send(&first[3..]).await.unwrap();
        let mut merged = second.clone();
        merged.extend_from_slice(&third);
        server.send(&merged).await.unwrap();
        server.close().await.unwrap();
        server
    };

    let (result, _server) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(client.run(), script)
    })
    .await
    .expect("test timed out");

    result.unwrap();
    assert_eq!(
        chat_lines(&sink.events()),
        vec!["Bob : one", "Carol : two", "Dave : three"]
    );
}

#[tokio::test]
async fn test_client_goes_online_after_first_message() {
    let (client, server, _sink) = client_with(alice());
    let session = client.session();
    assert_eq!(session.state(), SessionState::Connecting);

    let observed = session.clone();
    let script = async move {
        server.send(&player_chat("Bob : hi")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = observed.state();
        server.close().await.unwrap();
        state
    };

    let (result, state_while_running) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(client.run(), script)
    })
    .await
    .expect("test timed out");

    result.unwrap();
    assert_eq!(state_while_running, SessionState::Online);
    assert_eq!(session.state(), SessionState::Closed);
}

// =========================================================================
// Outgoing and correlation
// =========================================================================

#[tokio::test]
async fn test_client_flushes_whispers_and_correlates_responses() {
    let (client, server, sink) = client_with(alice());
    let chat = client.chat();
    chat.whisper("bob", "one").unwrap();
    chat.whisper("carol", "two").unwrap();
    chat.whisper("dave", "three").unwrap();

    let script = async move {
        let mut recipients = Vec::new();
        for _ in 0..3 {
            let frame = server.recv().await.unwrap().unwrap();
            assert_eq!(&frame[..2], &cmsg::CHAT_WHISPER.to_le_bytes());
            let nick = &frame[4..28];
            let end = nick.iter().position(|&b| b == 0).unwrap_or(nick.len());
            recipients.push(String::from_utf8_lossy(&nick[..end]).into_owned());
        }
        for kind in [0, 1, 2, 0] {
            server.send(&whisper_response(kind)).await.unwrap();
        }
        server.close().await.unwrap();
        recipients
    };

    let (result, recipients) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(client.run(), script)
    })
    .await
    .expect("test timed out");

    result.unwrap();
    assert_eq!(recipients, vec!["bob", "carol", "dave"]);
    assert_eq!(
        sink.events(),
        vec![
            ChatEvent::WhisperDelivered { nick: "bob".into() },
            ChatEvent::Whisper {
                nick: "carol".into(),
                text: "Whisper could not be sent, carol is offline.".into(),
                kind: ChatMsgType::ByServer,
            },
            ChatEvent::Whisper {
                nick: "dave".into(),
                text: "Whisper could not be sent, ignored by dave.".into(),
                kind: ChatMsgType::ByServer,
            },
        ]
    );
    assert!(chat.pending_whispers().is_empty());
}

#[tokio::test]
async fn test_client_requests_fail_after_loop_stops() {
    let (client, server, _sink) = client_with(alice());
    let chat = client.chat();
    server.close().await.unwrap();

    tokio::time::timeout(TEST_TIMEOUT, client.run())
        .await
        .expect("test timed out")
        .unwrap();

    let err = chat.talk("anyone?").unwrap_err();
    assert!(matches!(err, ProtocolError::Transport(_)));
}

// =========================================================================
// Errors
// =========================================================================

#[tokio::test]
async fn test_client_connection_problem_ends_loop() {
    let (client, server, sink) = client_with(alice());
    let session = client.session();

    let script = async move {
        server.send(&[0x81, 0x00, 3]).await.unwrap();
        // Never reached by the client: the loop stops at the problem.
        server.send(&player_chat("Bob : late")).await.unwrap();
        server
    };

    let (result, _server) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(client.run(), script)
    })
    .await
    .expect("test timed out");

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ManalinkError::ConnectionProblem(ConnectionProblem::SpeedHack)
    ));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_client_strict_framing_rejects_unknown_opcode() {
    let (client, server, _sink) = client_with(alice());

    let script = async move {
        server.send(&[0xff, 0x7f, 0x00, 0x00]).await.unwrap();
        server
    };

    let (result, _server) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(client.run(), script)
    })
    .await
    .expect("test timed out");

    assert!(matches!(
        result.unwrap_err(),
        ManalinkError::Protocol(ProtocolError::UnknownOpcode { opcode: 0x7fff })
    ));
}

#[tokio::test]
async fn test_client_lenient_framing_discards_and_continues() {
    let (client, server, sink) = client_with(alice().strict_framing(false));

    let script = async move {
        server.send(&[0xff, 0x7f, 0x01, 0x02]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        server.send(&player_chat("Bob : still here")).await.unwrap();
        server.close().await.unwrap();
        server
    };

    let (result, _server) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(client.run(), script)
    })
    .await
    .expect("test timed out");

    result.unwrap();
    assert_eq!(chat_lines(&sink.events()), vec!["Bob : still here"]);
}

// =========================================================================
// Registration
// =========================================================================

struct CountingChat {
    seen: AtomicUsize,
}

impl MessageHandler for CountingChat {
    fn handled_messages(&self) -> &[u16] {
        &[smsg::PLAYER_CHAT]
    }

    fn handle_message(&self, msg: &mut MessageIn<'_>) {
        let len = msg.read_i16("len");
        msg.skip(usize::try_from(len).unwrap_or(4).saturating_sub(4), "body");
        self.seen.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_client_registered_handler_takes_over_opcode() {
    let (mut client, server, sink) = client_with(alice());
    let counter = Arc::new(CountingChat {
        seen: AtomicUsize::new(0),
    });
    client.register(counter.clone());

    let script = async move {
        server.send(&player_chat("Bob : one")).await.unwrap();
        server.send(&player_chat("Bob : two")).await.unwrap();
        server.close().await.unwrap();
        server
    };

    let (result, _server) = tokio::time::timeout(TEST_TIMEOUT, async {
        tokio::join!(client.run(), script)
    })
    .await
    .expect("test timed out");

    result.unwrap();
    assert_eq!(counter.seen.load(Ordering::SeqCst), 2);
    assert!(sink.is_empty());
}
