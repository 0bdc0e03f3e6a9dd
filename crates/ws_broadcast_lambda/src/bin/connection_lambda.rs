use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use ws_broadcast_lambda::adapters::dynamodb::DynamoConnectionStore;
use ws_broadcast_lambda::config::BroadcastConfig;
use ws_broadcast_lambda::handlers::connection::handle_route_event;
use ws_broadcast_lambda::handlers::response::ApiGatewayResponse;
use ws_broadcast_lambda::telemetry::init_tracing;

async fn handle_request(
    event: LambdaEvent<Value>,
    table: &str,
    store: &DynamoConnectionStore,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_route_event(event.payload, table, store).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = BroadcastConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let sdk_config = config.load_sdk_config().await;
    let store = DynamoConnectionStore::new(aws_sdk_dynamodb::Client::new(&sdk_config));

    let table = config.table_name.as_str();
    let store = &store;
    lambda_runtime::run(service_fn(move |event| handle_request(event, table, store))).await
}
