//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and a real tokio-tungstenite client to
//! verify that frames actually flow both ways, that ids are assigned,
//! and that a clean close surfaces as `Ok(None)`.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use plaza_transport::{Connection, Transport, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds a transport on a random port and returns it with the
    /// address a client should dial.
    async fn bind_transport() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport
            .local_addr()
            .expect("should have local addr")
            .to_string();
        (transport, addr)
    }

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind_transport().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends, client receives (as a text frame: the
        // payload is valid UTF-8) ---
        server_conn
            .send(br#"{"type":"Token","token":"ab12"}"#)
            .await
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "JSON payloads go out as text frames");
        assert_eq!(
            msg.into_data().as_ref(),
            br#"{"type":"Token","token":"ab12"}"#,
        );

        // --- Client sends, server receives ---
        client_ws
            .send(Message::text("hello from client"))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hello from client");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_transport().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending() {
        // The relay depends on this: a parked reader must not block an
        // outbound send on the same connection.
        let (mut transport, addr) = bind_transport().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        // Park a reader on the connection.
        let reader = {
            let conn = server_conn.clone();
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;

        // Sending must still complete promptly.
        server_conn.send(b"pushed").await.expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"pushed");

        // Unblock the reader and let it finish.
        client_ws.send(Message::text("done")).await.unwrap();
        let received = reader.await.unwrap().unwrap();
        assert_eq!(received, Some(b"done".to_vec()));
    }

    #[tokio::test]
    async fn test_websocket_connection_ids_are_distinct() {
        let (mut transport, addr) = bind_transport().await;

        let server_handle = tokio::spawn(async move {
            let first = transport.accept().await.expect("accept 1");
            let second = transport.accept().await.expect("accept 2");
            (first, second)
        });

        let _c1 = connect_client(&addr).await;
        let _c2 = connect_client(&addr).await;
        let (first, second) = server_handle.await.unwrap();

        assert_ne!(first.id(), second.id());
        assert!(second.id().into_inner() > first.id().into_inner());
    }
}
