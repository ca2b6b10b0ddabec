//! StompSink - publishes records to a message broker over STOMP 1.2
//!
//! Text frames over a plain TCP stream: CONNECT on setup, one SEND frame
//! per record with a JSON-serialized body.

use std::time::Duration;

use contracts::{BroadcastError, BroadcastSink, EmittedRecord};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

/// Configuration for StompSink
#[derive(Debug, Clone)]
pub struct StompSinkConfig {
    /// Broker address, `host:port`
    pub broker: String,
    /// Login name
    pub login: String,
    /// Passcode
    pub passcode: String,
    /// Connection attempts before giving up
    pub connect_attempts: u32,
    /// Delay between attempts
    pub connect_interval: Duration,
}

impl StompSinkConfig {
    fn host_and_port(&self) -> Result<(&str, u16), BroadcastError> {
        let (host, port) = self.broker.split_once(':').ok_or_else(|| {
            BroadcastError::sink_connection(
                "stomp",
                format!("broker address '{}' is not host:port", self.broker),
            )
        })?;
        let port: u16 = port.parse().map_err(|_| {
            BroadcastError::sink_connection(
                "stomp",
                format!("invalid broker port in '{}'", self.broker),
            )
        })?;
        Ok((host, port))
    }
}

/// Sink that publishes each record to its destination queue or topic
#[derive(Debug)]
pub struct StompSink {
    name: String,
    stream: Option<TcpStream>,
}

impl StompSink {
    /// Connect to the broker, retrying up to the configured attempt count
    #[instrument(name = "stomp_sink_connect", skip(name, config), fields(broker = %config.broker))]
    pub async fn connect(
        name: impl Into<String>,
        config: &StompSinkConfig,
    ) -> Result<Self, BroadcastError> {
        let name = name.into();
        let (host, port) = config.host_and_port()?;
        let attempts = config.connect_attempts.max(1);

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match Self::try_connect(host, port, config).await {
                Ok(stream) => {
                    debug!(sink = %name, broker = %config.broker, "StompSink connected");
                    return Ok(Self {
                        name,
                        stream: Some(stream),
                    });
                }
                Err(e) => {
                    warn!(
                        sink = %name,
                        attempt,
                        attempts,
                        error = %e,
                        "Broker connection attempt failed"
                    );
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(config.connect_interval).await;
                    }
                }
            }
        }

        Err(BroadcastError::sink_connection(
            name,
            format!("failed to connect to broker after {attempts} attempts: {last_error}"),
        ))
    }

    async fn try_connect(
        host: &str,
        port: u16,
        config: &StompSinkConfig,
    ) -> Result<TcpStream, BroadcastError> {
        let mut stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| BroadcastError::sink_connection("stomp", e.to_string()))?;

        let connect = encode_frame(
            "CONNECT",
            &[
                ("accept-version", "1.2"),
                ("host", host),
                ("login", &config.login),
                ("passcode", &config.passcode),
            ],
            "",
        );
        stream
            .write_all(&connect)
            .await
            .map_err(|e| BroadcastError::sink_connection("stomp", e.to_string()))?;

        let reply = read_frame(&mut stream)
            .await
            .map_err(|e| BroadcastError::sink_connection("stomp", e.to_string()))?;
        if !reply.trim_start().starts_with("CONNECTED") {
            let command = reply.lines().next().unwrap_or("<empty>").to_string();
            return Err(BroadcastError::sink_connection(
                "stomp",
                format!("broker rejected connection: {command}"),
            ));
        }

        Ok(stream)
    }

    fn stream(&mut self) -> Result<&mut TcpStream, BroadcastError> {
        let name = self.name.clone();
        self.stream
            .as_mut()
            .ok_or_else(|| BroadcastError::sink_send(name, "broker connection closed"))
    }
}

impl BroadcastSink for StompSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "stomp_sink_send",
        skip(self, record),
        fields(sink = %self.name, destination = %record.destination)
    )]
    async fn send(&mut self, record: &EmittedRecord) -> Result<(), BroadcastError> {
        let name = self.name.clone();
        let body = serde_json::to_string(&record.value)
            .map_err(|e| BroadcastError::sink_send(&name, format!("json error: {e}")))?;

        let length = body.len().to_string();
        let frame = encode_frame(
            "SEND",
            &[
                ("destination", record.destination.as_str()),
                ("content-type", "application/json"),
                ("content-length", &length),
            ],
            &body,
        );

        let stream = self.stream()?;
        stream
            .write_all(&frame)
            .await
            .map_err(|e| BroadcastError::sink_send(&name, e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| BroadcastError::sink_send(&name, e.to_string()))?;

        debug!(sink = %name, destination = %record.destination, bytes = frame.len(), "Sent");
        Ok(())
    }

    #[instrument(name = "stomp_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), BroadcastError> {
        if let Some(mut stream) = self.stream.take() {
            // Best-effort goodbye; the broker drops the session either way
            let _ = stream
                .write_all(&encode_frame("DISCONNECT", &[], ""))
                .await;
            let _ = stream.shutdown().await;
            debug!(sink = %self.name, "StompSink closed");
        }
        Ok(())
    }
}

/// Encode one STOMP frame: command, headers, blank line, body, NUL
fn encode_frame(command: &str, headers: &[(&str, &str)], body: &str) -> Vec<u8> {
    let mut frame = String::new();
    frame.push_str(command);
    frame.push('\n');
    for (key, value) in headers {
        frame.push_str(key);
        frame.push(':');
        frame.push_str(value);
        frame.push('\n');
    }
    frame.push('\n');
    frame.push_str(body);
    let mut bytes = frame.into_bytes();
    bytes.push(0);
    bytes
}

/// Read one NUL-terminated frame from the stream
async fn read_frame(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "broker closed the connection mid-frame",
            ));
        }
        if byte[0] == 0 {
            break;
        }
        buf.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SignalValue;
    use tokio::net::TcpListener;

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame("SEND", &[("destination", "QUEUE.a")], "{\"k\":1}");
        assert_eq!(
            frame,
            b"SEND\ndestination:QUEUE.a\n\n{\"k\":1}\0".to_vec()
        );
    }

    #[test]
    fn test_config_address_parsing() {
        let config = StompSinkConfig {
            broker: "amq.example.org:61613".to_string(),
            login: "icat".to_string(),
            passcode: "icat".to_string(),
            connect_attempts: 1,
            connect_interval: Duration::from_millis(10),
        };
        assert_eq!(
            config.host_and_port().unwrap(),
            ("amq.example.org", 61613)
        );

        let bad = StompSinkConfig {
            broker: "no-port".to_string(),
            ..config
        };
        assert!(bad.host_and_port().is_err());
    }

    async fn fake_broker() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, format!("127.0.0.1:{}", addr.port()))
    }

    #[tokio::test]
    async fn test_connect_and_send_against_fake_broker() {
        let (listener, broker) = fake_broker().await;

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let connect = read_frame(&mut socket).await.unwrap();
            assert!(connect.starts_with("CONNECT\n"));
            assert!(connect.contains("login:user"));

            socket
                .write_all(b"CONNECTED\nversion:1.2\n\n\0")
                .await
                .unwrap();

            let send = read_frame(&mut socket).await.unwrap();
            assert!(send.starts_with("SEND\n"));
            assert!(send.contains("destination:TOPIC.status"));
            assert!(send.ends_with("\"Running\""));
        });

        let config = StompSinkConfig {
            broker,
            login: "user".to_string(),
            passcode: "pass".to_string(),
            connect_attempts: 1,
            connect_interval: Duration::from_millis(10),
        };
        let mut sink = StompSink::connect("amq", &config).await.unwrap();

        let record = EmittedRecord {
            destination: "TOPIC.status".to_string(),
            instrument: None,
            name: None,
            value: SignalValue::Json(serde_json::json!("Running")),
        };
        sink.send(&record).await.unwrap();
        sink.close().await.unwrap();

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_exhausts_attempts() {
        // Nothing listens on this address once the listener drops
        let (listener, broker) = fake_broker().await;
        drop(listener);

        let config = StompSinkConfig {
            broker,
            login: "user".to_string(),
            passcode: "pass".to_string(),
            connect_attempts: 2,
            connect_interval: Duration::from_millis(1),
        };

        let err = StompSink::connect("amq", &config).await.unwrap_err();
        assert!(err.to_string().contains("after 2 attempts"), "{err}");
    }
}
