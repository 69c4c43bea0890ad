//! Integration tests for the admin and general handlers.

use std::sync::Arc;

use manalink_handlers::{
    AccountStats, AdminHandler, ChatEvent, ChatHandler, ConnectionProblem, GeneralHandler,
    HandlerContext, RecordingSink,
};
use manalink_protocol::opcodes::{cmsg, smsg};
use manalink_protocol::{Dispatch, Dispatcher, MessageHandler, MessageIn, ServerType};
use manalink_session::{Session, SessionConfig, SessionState};
use manalink_transport::{OutboxReceiver, outbox};

// =========================================================================
// Fixture
// =========================================================================

struct Fixture {
    admin: Arc<AdminHandler>,
    general: Arc<GeneralHandler>,
    session: Arc<Session>,
    sink: Arc<RecordingSink>,
    sent: OutboxReceiver,
    dispatcher: Dispatcher,
}

fn fixture_for(server: ServerType) -> Fixture {
    let (out, sent) = outbox();
    let session = Arc::new(Session::new(SessionConfig::new(server, "Gm")));
    let sink = Arc::new(RecordingSink::new());
    let ctx = HandlerContext::new(out, session.clone())
        .with_chat_sink(sink.clone())
        .with_admin_sink(sink.clone());
    let chat = Arc::new(ChatHandler::new(ctx.clone()));
    let admin = Arc::new(AdminHandler::new(ctx.clone(), chat.clone()));
    let general = Arc::new(GeneralHandler::new(ctx));

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(chat);
    dispatcher.register(admin.clone());
    dispatcher.register(general.clone());
    Fixture {
        admin,
        general,
        session,
        sink,
        sent,
        dispatcher,
    }
}

fn fixture() -> Fixture {
    fixture_for(ServerType::EAthena)
}

fn fixed(opcode: u16, body: &[u8]) -> Vec<u8> {
    let mut frame = opcode.to_le_bytes().to_vec();
    frame.extend_from_slice(body);
    frame
}

fn field(text: &str, width: usize) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(width, 0);
    bytes
}

fn feed(f: &Fixture, frame: &[u8]) -> Dispatch {
    let mut msg = MessageIn::new(frame);
    let outcome = f.dispatcher.dispatch(&mut msg);
    assert!(!msg.is_malformed());
    outcome
}

// =========================================================================
// Registration
// =========================================================================

#[test]
fn test_admin_account_stats_registered_only_on_eathena() {
    let ea = fixture();
    assert!(ea.admin.handled_messages().contains(&smsg::ADMIN_ACCOUNT_STATS));
    assert_eq!(
        ea.dispatcher.handler_for(smsg::ADMIN_ACCOUNT_STATS).map(|h| h.name()),
        Some("admin")
    );

    let tmwa = fixture_for(ServerType::TmwAthena);
    assert!(!tmwa.admin.handled_messages().contains(&smsg::ADMIN_ACCOUNT_STATS));
    assert!(tmwa.dispatcher.handler_for(smsg::ADMIN_ACCOUNT_STATS).is_none());
}

#[test]
fn test_dispatcher_routes_each_domain() {
    let f = fixture();
    let name = |opcode| f.dispatcher.handler_for(opcode).map(|h| h.name());
    assert_eq!(name(smsg::WHISPER), Some("chat"));
    assert_eq!(name(smsg::ADMIN_KICK_ACK), Some("admin"));
    assert_eq!(name(smsg::CONNECTION_PROBLEM), Some("general"));
}

// =========================================================================
// Requests
// =========================================================================

#[test]
fn test_admin_fixed_requests_layouts() {
    let mut f = fixture();
    f.admin.kick(2_000_001).unwrap();
    f.admin.kick_all().unwrap();
    f.admin.hide(true).unwrap();
    f.admin.reset_stats().unwrap();
    f.admin.reset_skills().unwrap();
    f.admin.request_login(7).unwrap();
    f.admin.set_tile_type(10, 20, 1).unwrap();

    let frames = f.sent.drain();
    assert_eq!(frames[0], fixed(cmsg::ADMIN_KICK, &2_000_001i32.to_le_bytes()));
    assert_eq!(frames[1], fixed(cmsg::ADMIN_KICK_ALL, &[]));
    assert_eq!(frames[2], fixed(cmsg::ADMIN_HIDE, &1i32.to_le_bytes()));
    assert_eq!(frames[3], fixed(cmsg::ADMIN_RESET_PLAYER, &0i16.to_le_bytes()));
    assert_eq!(frames[4], fixed(cmsg::ADMIN_RESET_PLAYER, &1i16.to_le_bytes()));
    assert_eq!(frames[5], fixed(cmsg::ADMIN_ID_TO_LOGIN, &7i32.to_le_bytes()));
    assert_eq!(
        frames[6],
        fixed(cmsg::ADMIN_SET_TILE_TYPE, &[10, 0, 20, 0, 1, 0])
    );
}

#[test]
fn test_admin_mute_layout() {
    let mut f = fixture();
    f.admin.mute(150_000, 1, 30).unwrap();
    let mut body = 150_000i32.to_le_bytes().to_vec();
    body.push(1);
    body.extend_from_slice(&30i16.to_le_bytes());
    assert_eq!(f.sent.drain(), vec![fixed(cmsg::ADMIN_MUTE, &body)]);
}

#[test]
fn test_admin_name_requests_use_nick_width() {
    let mut f = fixture();
    f.admin.goto_name("Bob").unwrap();
    f.admin.recall_name("Bob").unwrap();
    f.admin.mute_name("Bob").unwrap();
    assert_eq!(
        f.sent.drain(),
        vec![
            fixed(cmsg::ADMIN_GOTO, &field("Bob", 24)),
            fixed(cmsg::ADMIN_RECALL, &field("Bob", 24)),
            fixed(cmsg::ADMIN_MUTE_NAME, &field("Bob", 24)),
        ]
    );
}

#[test]
fn test_admin_announce_is_variable_without_terminator() {
    let mut f = fixture();
    f.admin.announce("Restart soon").unwrap();
    f.admin.local_announce("hi").unwrap();
    let frames = f.sent.drain();

    let mut expected = cmsg::ADMIN_ANNOUNCE.to_le_bytes().to_vec();
    expected.extend_from_slice(&16u16.to_le_bytes());
    expected.extend_from_slice(b"Restart soon");
    assert_eq!(frames[0], expected);
    assert_eq!(&frames[1][..2], &cmsg::ADMIN_LOCAL_ANNOUNCE.to_le_bytes());
    assert_eq!(&frames[1][4..], b"hi");
}

#[test]
fn test_admin_commands_are_typed_in_chat() {
    let mut f = fixture();
    f.admin.ban_name("Troll").unwrap();
    f.admin.warp("001-1", 50, 60).unwrap();
    f.admin.create_items(501, 10).unwrap();
    f.admin.request_stats("Bob").unwrap();

    let lines: Vec<Vec<u8>> = f
        .sent
        .drain()
        .into_iter()
        .inspect(|frame| assert_eq!(&frame[..2], &cmsg::CHAT_MESSAGE.to_le_bytes()))
        .map(|frame| frame[4..].to_vec())
        .collect();
    assert_eq!(
        lines,
        vec![
            b"Gm : @ban Troll\0".to_vec(),
            b"Gm : @warp 001-1 50 60\0".to_vec(),
            b"Gm : @item 501 10\0".to_vec(),
            b"Gm : @stats Bob\0".to_vec(),
        ]
    );
}

// =========================================================================
// Replies
// =========================================================================

#[test]
fn test_kick_ack_reports_outcome() {
    let f = fixture();
    feed(&f, &fixed(smsg::ADMIN_KICK_ACK, &150_000i32.to_le_bytes()));
    feed(&f, &fixed(smsg::ADMIN_KICK_ACK, &0i32.to_le_bytes()));
    assert_eq!(
        f.sink.take(),
        vec![
            ChatEvent::KickResult {
                account_id: 150_000,
                succeeded: true
            },
            ChatEvent::KickResult {
                account_id: 0,
                succeeded: false
            },
        ]
    );
}

#[test]
fn test_login_ack_reports_login() {
    let f = fixture();
    let mut body = 2_000_001i32.to_le_bytes().to_vec();
    body.extend_from_slice(&field("bob_account", 24));
    feed(&f, &fixed(smsg::ADMIN_GET_LOGIN_ACK, &body));
    assert_eq!(
        f.sink.take(),
        vec![ChatEvent::LoginOf {
            account_id: 2_000_001,
            login: "bob_account".into()
        }]
    );
}

#[test]
fn test_set_tile_type_reports_change() {
    let f = fixture();
    let mut body = Vec::new();
    for v in [12i16, 34, 1] {
        body.extend_from_slice(&v.to_le_bytes());
    }
    body.extend_from_slice(&field("009-1", 16));
    feed(&f, &fixed(smsg::ADMIN_SET_TILE_TYPE, &body));

    let events = f.sink.take();
    let [ChatEvent::TileTypeChanged { change }] = events.as_slice() else {
        panic!("unexpected events: {events:?}");
    };
    assert_eq!((change.x, change.y, change.kind), (12, 34, 1));
    assert_eq!(change.map, "009-1");
}

#[test]
fn test_account_stats_decodes_all_fields() {
    let f = fixture();
    let mut body = Vec::new();
    for i in 0..6u8 {
        body.push(10 + i);
        body.push(2);
    }
    for v in 1..=14i16 {
        body.extend_from_slice(&v.to_le_bytes());
    }
    let frame = fixed(smsg::ADMIN_ACCOUNT_STATS, &body);
    assert_eq!(frame.len(), 42);
    feed(&f, &frame);

    let events = f.sink.take();
    let [ChatEvent::AccountStats { stats }] = events.as_slice() else {
        panic!("unexpected events: {events:?}");
    };
    assert_eq!(
        *stats,
        AccountStats {
            base: [10, 11, 12, 13, 14, 15],
            needed: [2; 6],
            attack_base: 1,
            attack_mod: 2,
            matk_max: 3,
            matk_min: 4,
            def: 5,
            def_mod: 6,
            mdef: 7,
            mdef_mod: 8,
            hit: 9,
            flee: 10,
            flee2: 11,
            critical: 12,
            karma: 13,
            manner: 14,
        }
    );
}

// =========================================================================
// Connection problems
// =========================================================================

#[test]
fn test_connection_problem_is_recorded_once() {
    let f = fixture();
    feed(&f, &fixed(smsg::CONNECTION_PROBLEM, &[3]));
    assert_eq!(f.general.take_problem(), Some(ConnectionProblem::SpeedHack));
    assert_eq!(f.general.take_problem(), None);
}

#[test]
fn test_already_logged_in_depends_on_session_state() {
    let f = fixture();
    feed(&f, &fixed(smsg::CONNECTION_PROBLEM, &[2]));
    assert_eq!(
        f.general.take_problem(),
        Some(ConnectionProblem::AlreadyLoggedIn { in_game: false })
    );

    f.session.transition(SessionState::Online).unwrap();
    feed(&f, &fixed(smsg::CONNECTION_PROBLEM, &[2]));
    assert_eq!(
        f.general.take_problem(),
        Some(ConnectionProblem::AlreadyLoggedIn { in_game: true })
    );
}

#[test]
fn test_unknown_connection_problem_keeps_code() {
    let f = fixture();
    feed(&f, &fixed(smsg::CONNECTION_PROBLEM, &[42]));
    assert_eq!(
        f.general.take_problem(),
        Some(ConnectionProblem::Unknown { code: 42 })
    );
}
