use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use wepx_codec::frame::encode_i_frame;
use wepx_codec::Record;
use wepx_server::TailStreamingServer;
use wepx_stream::StreamWriter;

/// S6: a client that connected before any write receives exactly three messages, with payload
/// lengths matching the three appended records, in order.
#[tokio::test]
async fn client_receives_every_appended_record_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let data_root = dir.path().to_path_buf();
    let stream_path = data_root.join("hrdps").join("1700000000").join("temp_2m_surface.wepx");

    let server = TailStreamingServer::bind("127.0.0.1:0", data_root.clone()).await.unwrap();
    // bind to an ephemeral port, so pull the actual address back out for the client to connect to.
    let addr = server_local_addr(&server);
    tokio::spawn(server.serve());

    let url = format!("ws://{addr}/hrdps/1700000000/temp_2m_surface");
    let (ws_stream, _) = connect_async(&url).await.unwrap();
    let (_ws_tx, mut ws_rx) = ws_stream.split();

    // give the server a moment to complete the handshake and start tailing before we write.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (frame1, _) = encode_i_frame(&vec![1.0, 2.0, 3.0, 4.0], 2, 2, None, 0).unwrap();
    let (frame2, meta) = encode_i_frame(&vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0], 3, 2, None, 1).unwrap();
    let frame3 = wepx_codec::frame::encode_p_frame(&[5.0, 6.0, 7.0, 8.0, 9.0, 10.0], &[5.0, 6.0, 7.0, 8.0, 9.0, 11.0], &meta, 2).unwrap();

    let lengths: Vec<usize> = [&frame1, &frame2, &frame3].iter().map(|f| f.payload.len()).collect();

    let mut writer = StreamWriter::create_fresh(&stream_path).unwrap();
    for frame in [frame1, frame2, frame3] {
        writer.append_record(&Record::from_encoded(frame)).unwrap();
    }
    drop(writer);

    let mut received_lengths = Vec::new();
    for _ in 0..3 {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws_rx.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended early")
            .unwrap();
        let bytes = msg.into_data();
        assert_eq!(bytes[0], 0x00); // stream_id byte
        received_lengths.push(bytes.len() - 2); // strip <stream_id><frame_type>
    }

    assert_eq!(received_lengths, lengths);
}

fn server_local_addr(server: &TailStreamingServer) -> std::net::SocketAddr {
    server.local_addr().expect("server must be bound to a local address")
}
