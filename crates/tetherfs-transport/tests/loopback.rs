//! Exercises the listener/client state machine end-to-end over the real
//! platform backend (a Unix domain socket on non-Windows targets).

use std::thread;

use tetherfs_transport::{ChannelState, HelperListener};
use tetherfs_wire::Envelope;

fn channel_name(test: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    // Leak the tempdir for the duration of the test process; the socket
    // file is cleaned up by `HelperListener::bind`'s stale-file removal
    // on the next run regardless.
    let path = dir.into_path().join(format!("tetherfs-{test}.sock"));
    path.to_string_lossy().into_owned()
}

#[test]
fn client_connects_and_exchanges_one_envelope() {
    let name = channel_name("roundtrip");
    let mut listener = HelperListener::bind(&name).unwrap();
    assert_eq!(listener.state(), ChannelState::Listening);

    let server = thread::spawn(move || {
        let mut session = listener.accept().unwrap();
        let request = session.recv().unwrap();
        assert_eq!(request.msg_type, 1);
        session.send(&Envelope::new(1, vec![0xAB])).unwrap();
    });

    // Give the listener a moment to start accepting.
    thread::sleep(std::time::Duration::from_millis(50));
    let mut client = tetherfs_transport::connect(&name).unwrap();
    client.send(&Envelope::new(1, vec![1, 2, 3])).unwrap();
    let reply = client.recv().unwrap();
    assert_eq!(reply.body, vec![0xAB]);

    server.join().unwrap();
}

#[test]
fn second_concurrent_client_is_refused() {
    let name = channel_name("single-client");
    let mut listener = HelperListener::bind(&name).unwrap();

    let server = thread::spawn(move || {
        let _first = listener.accept().unwrap();
        // Hold the first session open while a second connection attempt
        // is made; it should be silently refused rather than replacing
        // the first session.
        thread::sleep(std::time::Duration::from_millis(150));
    });

    thread::sleep(std::time::Duration::from_millis(50));
    let _first_client = tetherfs_transport::connect(&name).unwrap();
    let _second_client = tetherfs_transport::connect(&name).unwrap();

    server.join().unwrap();
}
