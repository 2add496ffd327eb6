use serde_json::{Value, json};
use shellbridge::{
    Bridge, BridgeConfig, ChannelTransport, HostBindings, InboundMessage, JAVASCRIPT_CHANNEL,
    NATIVE_CHANNEL, OutboundMessage, Response,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shellbridge=debug".into()),
        )
        .init();

    // The host shell injects its transport before the page starts.
    let bindings = Arc::new(HostBindings::new());
    let (transport, mut host) = ChannelTransport::create_pair("demo");
    bindings.bind_transport(NATIVE_CHANNEL, transport);

    let bridge = Bridge::attach(&bindings, BridgeConfig::default())?;
    println!("[Page] channel available: {}", bridge.is_channel_available());

    // Host loop: answer pings, echo events back under "echo".
    let shell = bindings.clone();
    let host_task = tokio::spawn(async move {
        while let Ok(message) = host.recv_message().await {
            let reply = match message {
                OutboundMessage::Request { id, payload } => {
                    println!("[Host] request {} -> {}", id, payload);
                    let response = if payload["op"] == "ping" {
                        Response::success("pong")
                    } else {
                        Response::error("unsupported op")
                    };
                    InboundMessage::response(id, &response)
                }
                OutboundMessage::Publisher {
                    event_name,
                    payload,
                } => {
                    println!("[Host] event {} -> {}", event_name, payload);
                    Ok(InboundMessage::publisher("echo", payload))
                }
            };
            match reply {
                Ok(reply) => {
                    shell.deliver(JAVASCRIPT_CHANNEL, reply);
                }
                Err(e) => eprintln!("[Host] failed to build reply: {}", e),
            }
        }
    });

    let echo = bridge.subscribe("echo", |payload: &Value| {
        println!("[Page] echo received: {}", payload);
    });
    bridge.publish_event("hello", &json!({"from": "page"}));

    let pong = bridge.request(&json!({"op": "ping"})).await?;
    println!("[Page] ping -> {}", pong);

    match bridge
        .request_with_timeout(&json!({"op": "reboot"}), Duration::from_millis(500))
        .await
    {
        Ok(value) => println!("[Page] reboot -> {}", value),
        Err(e) => println!("[Page] reboot failed: {}", e),
    }

    echo.unsubscribe();
    host_task.abort();
    Ok(())
}
