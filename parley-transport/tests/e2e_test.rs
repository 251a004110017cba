//! End-to-end transport tests against a scripted server socket.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use parley_core::cipher;
use parley_core::frame::{self, FrameBuffer};
use parley_transport::{ChatClient, ClientConfig};

async fn accept_pair(listener: &TcpListener) -> TcpStream {
    let (stream, _) = listener.accept().await.unwrap();
    stream
}

async fn read_frame(stream: &mut TcpStream, fb: &mut FrameBuffer) -> Vec<u8> {
    loop {
        if let Some(payload) = fb.next_frame().unwrap() {
            return payload;
        }
        let n = stream.read(fb.writable()).await.unwrap();
        assert_ne!(n, 0, "peer closed mid-frame");
        fb.advance(n).unwrap();
    }
}

async fn write_frame(stream: &mut TcpStream, payload: &[u8]) {
    let wire = frame::encode_frame(payload).unwrap();
    stream.write_all(&wire).await.unwrap();
}

async fn connect(listener: &TcpListener) -> (ChatClient, TcpStream) {
    let addr = listener.local_addr().unwrap();
    let config = ClientConfig::new(addr.ip().to_string(), addr.port());
    let (client, server_side) = tokio::join!(ChatClient::connect(&config), accept_pair(listener));
    (client.unwrap(), server_side)
}

#[tokio::test]
async fn test_plaintext_roundtrip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (mut client, mut server) = connect(&listener).await;
    let mut fb = FrameBuffer::new();

    client.send("hello server").await.unwrap();
    assert_eq!(read_frame(&mut server, &mut fb).await, b"hello server");

    write_frame(&mut server, b"hello client").await;
    assert_eq!(client.recv().await.unwrap(), "hello client");
}

#[tokio::test]
async fn test_outbound_obfuscation_and_skip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (client, mut server) = connect(&listener).await;
    let mut fb = FrameBuffer::new();

    assert!(client.toggle_obfuscation().await);

    client.send("hi there").await.unwrap();
    assert_eq!(read_frame(&mut server, &mut fb).await, b"ij!uifsf");

    // One-shot skip: the next message goes out in the clear, the one
    // after is encoded again.
    client.skip_encode_once().await;
    client.send("/w bob psst").await.unwrap();
    assert_eq!(read_frame(&mut server, &mut fb).await, b"/w bob psst");

    client.send("back on").await.unwrap();
    let mut expected = b"back on".to_vec();
    cipher::encode_payload(&mut expected);
    assert_eq!(read_frame(&mut server, &mut fb).await, expected);
}

#[tokio::test]
async fn test_inbound_decode_of_delivered_line() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (mut client, mut server) = connect(&listener).await;

    client.toggle_obfuscation().await;

    // The server prepends a plaintext header and relays the sender's
    // encoded tail untouched.
    let mut tail = b"alice: hello".to_vec();
    cipher::encode_payload(&mut tail);
    let mut line = b"[2026-08-07 10:00:00] ".to_vec();
    line.extend_from_slice(&tail);
    write_frame(&mut server, &line).await;

    assert_eq!(
        client.recv().await.unwrap(),
        "[2026-08-07 10:00:00] alice: hello"
    );
}

#[tokio::test]
async fn test_exempt_line_passes_through() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (mut client, mut server) = connect(&listener).await;

    client.toggle_obfuscation().await;

    write_frame(&mut server, b"welcome X").await;
    assert_eq!(client.recv().await.unwrap(), "welcome X");
}

#[tokio::test]
async fn test_server_close_ends_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (mut client, server) = connect(&listener).await;

    drop(server);
    assert_eq!(client.recv().await, None);
}
