//! A scripted bulb on 127.0.0.1 for exercising the network paths in tests.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
struct Behavior {
    silent: bool,
    error: bool,
    /// Indices (0-based, in arrival order) of datagrams left unanswered.
    drop: Vec<usize>,
    /// Send a non-JSON datagram before each reply and repeat the reply.
    chatty: bool,
}

pub(crate) struct FakeBulb {
    port: u16,
    received: Arc<Mutex<Vec<Value>>>,
    task: JoinHandle<()>,
}

impl FakeBulb {
    pub async fn start() -> Self {
        Self::with(Behavior::default()).await
    }

    /// Receives but never answers.
    pub async fn silent() -> Self {
        Self::with(Behavior {
            silent: true,
            ..Behavior::default()
        })
        .await
    }

    /// Answers every request with a protocol error object.
    pub async fn failing() -> Self {
        Self::with(Behavior {
            error: true,
            ..Behavior::default()
        })
        .await
    }

    pub async fn dropping(drop: Vec<usize>) -> Self {
        Self::with(Behavior {
            drop,
            ..Behavior::default()
        })
        .await
    }

    pub async fn chatty() -> Self {
        Self::with(Behavior {
            chatty: true,
            ..Behavior::default()
        })
        .await
    }

    async fn with(behavior: Behavior) -> Self {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = socket.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(serve(socket, behavior, Arc::clone(&received)));
        FakeBulb {
            port,
            received,
            task,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn received(&self) -> Vec<Value> {
        self.received.lock().await.clone()
    }

    /// `params` of every `setPilot` received so far.
    pub async fn pilots(&self) -> Vec<Value> {
        self.received()
            .await
            .into_iter()
            .filter(|msg| msg["method"] == "setPilot")
            .map(|msg| msg["params"].clone())
            .collect()
    }

    /// Wait (up to two seconds) until `count` datagrams have arrived.
    pub async fn wait_for(&self, count: usize) {
        for _ in 0..200 {
            if self.received.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for FakeBulb {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(socket: UdpSocket, behavior: Behavior, received: Arc<Mutex<Vec<Value>>>) {
    let mut pilot = json!({"state": true, "sceneId": 0, "temp": 2700, "dimming": 60})
        .as_object()
        .cloned()
        .unwrap_or_default();
    let mut buffer = [0u8; 4096];

    loop {
        let Ok((size, peer)) = socket.recv_from(&mut buffer).await else {
            return;
        };
        let Ok(msg) = serde_json::from_slice::<Value>(&buffer[..size]) else {
            continue;
        };
        let index = {
            let mut received = received.lock().await;
            received.push(msg.clone());
            received.len() - 1
        };
        if behavior.silent || behavior.drop.contains(&index) {
            continue;
        }

        let method = msg["method"].as_str().unwrap_or_default().to_string();
        let reply = if behavior.error {
            json!({"method": method, "error": {"code": -32601, "message": "Method not found"}})
        } else {
            json!({"method": method, "env": "pro", "result": answer(&method, &msg["params"], &mut pilot)})
        };
        reply_to(&socket, peer, &reply, &behavior).await;
    }
}

fn answer(method: &str, params: &Value, pilot: &mut Map<String, Value>) -> Value {
    match method {
        "setPilot" => {
            if let Some(params) = params.as_object() {
                if params.contains_key("r") {
                    pilot.remove("temp");
                }
                if params.contains_key("temp") {
                    for key in ["r", "g", "b"] {
                        pilot.remove(key);
                    }
                }
                pilot.extend(params.clone());
            }
            json!({"success": true})
        }
        "getPilot" => {
            let mut result = pilot.clone();
            result.insert("mac".into(), json!("a8bb50aabbcc"));
            result.insert("rssi".into(), json!(-55));
            Value::Object(result)
        }
        "getSystemConfig" => json!({
            "mac": "a8bb50aabbcc",
            "homeId": 1,
            "roomId": 2,
            "moduleName": "ESP01_SHRGB1C_31",
            "fwVersion": "1.25.0"
        }),
        _ => json!({}),
    }
}

async fn reply_to(socket: &UdpSocket, peer: SocketAddr, reply: &Value, behavior: &Behavior) {
    let bytes = serde_json::to_vec(reply).unwrap_or_default();
    if behavior.chatty {
        let _ = socket.send_to(b"garbage", peer).await;
        let _ = socket.send_to(&bytes, peer).await;
    }
    let _ = socket.send_to(&bytes, peer).await;
}
