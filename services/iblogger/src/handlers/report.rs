use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use han_protocols::{BusEvent, EventMessage, EventTypes, Topics};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    handlers::error_status,
    report::{StatisticsCalculator, StatisticsFilter, StatisticsInterval},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub sec_type: Option<String>,
    pub currency: Option<String>,
    pub underlying: Option<String>,
    pub max_points: Option<usize>,
}

/// 值为 ALL 的过滤参数等同于未设置
fn normalize_param(param: Option<String>) -> Option<String> {
    param.filter(|v| !v.is_empty() && v != "ALL")
}

/// 按周期查询交易统计
///
/// 首次查询触发计算并缓存，之后同一组参数直接命中缓存。
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(interval): Path<String>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Value>, StatusCode> {
    let interval = match interval.parse::<StatisticsInterval>() {
        Ok(interval) => interval,
        Err(e) => {
            tracing::error!("Rejected statistics interval: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let mut filter = StatisticsFilter::default();
    if let Some(sec_type) = normalize_param(query.sec_type) {
        filter.sec_type = Some(sec_type.parse().map_err(|_| StatusCode::BAD_REQUEST)?);
    }
    if let Some(currency) = normalize_param(query.currency) {
        filter.currency = Some(currency.parse().map_err(|_| StatusCode::BAD_REQUEST)?);
    }
    filter.underlying = normalize_param(query.underlying);

    if let Some(stats) = state.statistics.cached(interval, &filter, query.max_points) {
        let response = json!({
            "success": true,
            "data": stats,
            "cached": true
        });
        return Ok(Json(response));
    }

    let trades = match state
        .trade_store
        .list_trades(filter.sec_type, filter.currency, filter.underlying.as_deref())
        .await
    {
        Ok(trades) => trades,
        Err(e) => {
            tracing::error!("Failed to load trades: {}", e);
            return Err(error_status(&e));
        }
    };

    tracing::info!(
        "Calculating statistics, interval={}, trades={}",
        interval,
        trades.len()
    );
    let stats = StatisticsCalculator::calculate(&trades, interval);
    let tail = state
        .statistics
        .store(interval, &filter, stats, query.max_points);
    state.metrics.statistics_calculated.inc();

    let message = EventMessage::new(
        EventTypes::STATISTICS_CALCULATED,
        "iblogger",
        json!({ "interval": interval.to_string() }),
    );
    let _ = state.event_tx.send(BusEvent::new(Topics::REPORT, message));

    let response = json!({
        "success": true,
        "data": tail,
        "cached": false
    });
    Ok(Json(response))
}
