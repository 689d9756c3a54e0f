use super::Trade;
use crate::models::{Amount, Currency, SecType, Timestamp};
use chrono::{Datelike, Days, Months, NaiveDate};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 统计周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatisticsInterval {
    Day,
    Month,
    Year,
}

impl std::fmt::Display for StatisticsInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatisticsInterval::Day => write!(f, "DAY"),
            StatisticsInterval::Month => write!(f, "MONTH"),
            StatisticsInterval::Year => write!(f, "YEAR"),
        }
    }
}

impl std::str::FromStr for StatisticsInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAY" => Ok(StatisticsInterval::Day),
            "MONTH" => Ok(StatisticsInterval::Month),
            "YEAR" => Ok(StatisticsInterval::Year),
            _ => Err(anyhow::anyhow!("Invalid statistics interval: {}", s)),
        }
    }
}

/// 单个周期的交易统计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub id: u32,
    pub period_date: NaiveDate,
    pub num_execs: u32,
    pub num_opened: u32,
    pub num_closed: u32,
    pub num_winners: u32,
    pub num_losers: u32,
    pub pct_winners: f64,
    pub big_winner: Amount,
    pub big_loser: Amount,
    pub winners_profit: Amount,
    pub losers_loss: Amount,
    pub profit_loss: Amount,
    pub cumul_profit_loss: Amount,
}

/// 报表统计过滤条件，`None` 表示不限制
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsFilter {
    pub sec_type: Option<SecType>,
    pub currency: Option<Currency>,
    pub underlying: Option<String>,
}

/// 统计计算器
///
/// 结果按 (周期, 过滤条件) 缓存，避免重复计算。
pub struct StatisticsCalculator {
    cache: DashMap<String, Vec<Statistics>>,
}

impl StatisticsCalculator {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// 取缓存结果的尾部，最多 max_points 条
    pub fn cached(
        &self,
        interval: StatisticsInterval,
        filter: &StatisticsFilter,
        max_points: Option<usize>,
    ) -> Option<Vec<Statistics>> {
        let entry = self.cache.get(&Self::cache_key(interval, filter))?;
        Some(Self::tail(&entry, max_points))
    }

    /// 写入缓存并返回尾部
    pub fn store(
        &self,
        interval: StatisticsInterval,
        filter: &StatisticsFilter,
        stats: Vec<Statistics>,
        max_points: Option<usize>,
    ) -> Vec<Statistics> {
        let result = Self::tail(&stats, max_points);
        self.cache.insert(Self::cache_key(interval, filter), stats);
        result
    }

    /// 清空缓存，交易数据变化后调用
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    fn tail(stats: &[Statistics], max_points: Option<usize>) -> Vec<Statistics> {
        let size = stats.len();
        let max_points = match max_points {
            Some(mp) if mp < size => mp,
            _ => size,
        };
        stats[size - max_points..].to_vec()
    }

    fn cache_key(interval: StatisticsInterval, filter: &StatisticsFilter) -> String {
        format!(
            "{}_{}_{}_{}",
            interval,
            filter
                .sec_type
                .map(|v| v.to_string())
                .unwrap_or_else(|| "ALL".to_string()),
            filter
                .currency
                .map(|v| v.to_string())
                .unwrap_or_else(|| "ALL".to_string()),
            filter.underlying.as_deref().unwrap_or("ALL"),
        )
    }

    /// 逐周期统计
    ///
    /// 从最早开仓所在周期走到最晚开仓/平仓所在周期，对每个周期统计
    /// 成交数、开平仓数、赢/亏家数与金额，并累计盈亏。
    pub fn calculate(trades: &[Trade], interval: StatisticsInterval) -> Vec<Statistics> {
        let mut stats = Vec::new();

        if trades.is_empty() {
            return stats;
        }

        let first_period = begin_of_period(first_date(trades), interval);
        let last_period = begin_of_period(last_date(trades), interval);

        let mut period_date = first_period;
        let mut cumul_profit_loss = Decimal::ZERO;
        let mut stats_count = 1u32;

        while period_date <= last_period {
            let closed_for_period: Vec<&Trade> = trades
                .iter()
                .filter(|t| {
                    t.close_date
                        .map(|d| begin_of_period(d, interval) == period_date)
                        .unwrap_or(false)
                })
                .collect();

            let num_execs = executions_for_period(trades, period_date, interval);
            let num_opened = trades
                .iter()
                .filter(|t| begin_of_period(t.open_date, interval) == period_date)
                .count() as u32;
            let num_closed = closed_for_period.len() as u32;

            let mut num_winners = 0u32;
            let mut num_losers = 0u32;
            let mut winners_profit = Decimal::ZERO;
            let mut losers_loss = Decimal::ZERO;
            let mut big_winner = Decimal::ZERO;
            let mut big_loser = Decimal::ZERO;

            for trade in &closed_for_period {
                let pl = trade.profit_loss.unwrap_or(Decimal::ZERO);

                if pl >= Decimal::ZERO {
                    num_winners += 1;
                    winners_profit += pl;
                    if pl > big_winner {
                        big_winner = pl;
                    }
                } else {
                    num_losers += 1;
                    losers_loss += pl;
                    if pl < big_loser {
                        big_loser = pl;
                    }
                }
            }

            let pct_winners = if num_closed != 0 {
                round2(f64::from(num_winners) / f64::from(num_closed) * 100.0)
            } else {
                0.0
            };
            let profit_loss = winners_profit + losers_loss;
            cumul_profit_loss += profit_loss;

            stats.push(Statistics {
                id: stats_count,
                period_date,
                num_execs,
                num_opened,
                num_closed,
                num_winners,
                num_losers,
                pct_winners,
                big_winner,
                big_loser,
                winners_profit,
                losers_loss,
                profit_loss,
                cumul_profit_loss,
            });
            stats_count += 1;

            period_date = match interval {
                StatisticsInterval::Day => period_date + Days::new(1),
                StatisticsInterval::Month => period_date + Months::new(1),
                StatisticsInterval::Year => period_date + Months::new(12),
            };
        }

        stats
    }
}

impl Default for StatisticsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// 时间戳所在周期的起始日
pub fn begin_of_period(ts: Timestamp, interval: StatisticsInterval) -> NaiveDate {
    let date = ts.date_naive();
    match interval {
        StatisticsInterval::Day => date,
        StatisticsInterval::Month => date.with_day(1).unwrap_or(date),
        StatisticsInterval::Year => date.with_ordinal(1).unwrap_or(date),
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn first_date(trades: &[Trade]) -> Timestamp {
    trades
        .iter()
        .map(|t| t.open_date)
        .min()
        .expect("trades is not empty")
}

fn last_date(trades: &[Trade]) -> Timestamp {
    let last_opened = trades
        .iter()
        .map(|t| t.open_date)
        .max()
        .expect("trades is not empty");
    let last_closed = trades.iter().filter_map(|t| t.close_date).max();

    match last_closed {
        Some(closed) if closed > last_opened => closed,
        _ => last_opened,
    }
}

fn executions_for_period(
    trades: &[Trade],
    period_date: NaiveDate,
    interval: StatisticsInterval,
) -> u32 {
    let ids: HashSet<_> = trades
        .iter()
        .flat_map(|t| t.executions.iter())
        .filter(|e| begin_of_period(e.fill_date, interval) == period_date)
        .map(|e| e.id)
        .collect();
    ids.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderAction;
    use crate::report::{Execution, TradeType};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn execution(fill_date: Timestamp) -> Execution {
        Execution {
            id: Uuid::new_v4(),
            fill_date,
            action: OrderAction::Buy,
            quantity: dec!(100),
            price: dec!(50),
        }
    }

    fn trade(
        open: Timestamp,
        close: Option<Timestamp>,
        profit_loss: Option<Amount>,
    ) -> Trade {
        let mut executions = vec![execution(open)];
        if let Some(close) = close {
            executions.push(execution(close));
        }
        Trade {
            id: Uuid::new_v4(),
            trade_type: TradeType::Long,
            symbol: "AAPL".to_string(),
            underlying: Some("AAPL".to_string()),
            currency: Currency::Usd,
            sec_type: SecType::Stk,
            open_date: open,
            close_date: close,
            executions,
            profit_loss,
        }
    }

    #[test]
    fn test_empty_trades() {
        assert!(StatisticsCalculator::calculate(&[], StatisticsInterval::Day).is_empty());
    }

    #[test]
    fn test_begin_of_period() {
        let ts = ts(2018, 3, 17);
        assert_eq!(
            begin_of_period(ts, StatisticsInterval::Day),
            NaiveDate::from_ymd_opt(2018, 3, 17).unwrap()
        );
        assert_eq!(
            begin_of_period(ts, StatisticsInterval::Month),
            NaiveDate::from_ymd_opt(2018, 3, 1).unwrap()
        );
        assert_eq!(
            begin_of_period(ts, StatisticsInterval::Year),
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_monthly_buckets_and_cumulative_pl() {
        let trades = vec![
            // 一月开，一月平，赢 100
            trade(ts(2018, 1, 5), Some(ts(2018, 1, 20)), Some(dec!(100))),
            // 一月开，二月平，亏 40
            trade(ts(2018, 1, 10), Some(ts(2018, 2, 3)), Some(dec!(-40))),
            // 三月开，未平
            trade(ts(2018, 3, 2), None, None),
        ];

        let stats = StatisticsCalculator::calculate(&trades, StatisticsInterval::Month);
        assert_eq!(stats.len(), 3);

        let january = &stats[0];
        assert_eq!(january.period_date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(january.num_opened, 2);
        assert_eq!(january.num_closed, 1);
        assert_eq!(january.num_winners, 1);
        assert_eq!(january.num_losers, 0);
        assert_eq!(january.pct_winners, 100.0);
        assert_eq!(january.profit_loss, dec!(100));
        assert_eq!(january.cumul_profit_loss, dec!(100));
        // 一月有三笔成交：两笔开仓 + 一笔平仓
        assert_eq!(january.num_execs, 3);

        let february = &stats[1];
        assert_eq!(february.num_opened, 0);
        assert_eq!(february.num_closed, 1);
        assert_eq!(february.num_losers, 1);
        assert_eq!(february.big_loser, dec!(-40));
        assert_eq!(february.profit_loss, dec!(-40));
        assert_eq!(february.cumul_profit_loss, dec!(60));

        let march = &stats[2];
        assert_eq!(march.num_opened, 1);
        assert_eq!(march.num_closed, 0);
        assert_eq!(march.pct_winners, 0.0);
        assert_eq!(march.cumul_profit_loss, dec!(60));
    }

    #[test]
    fn test_winner_loser_extremes() {
        let trades = vec![
            trade(ts(2018, 5, 1), Some(ts(2018, 5, 2)), Some(dec!(250))),
            trade(ts(2018, 5, 1), Some(ts(2018, 5, 2)), Some(dec!(80))),
            trade(ts(2018, 5, 1), Some(ts(2018, 5, 2)), Some(dec!(-120))),
        ];

        let stats = StatisticsCalculator::calculate(&trades, StatisticsInterval::Year);
        assert_eq!(stats.len(), 1);

        let year = &stats[0];
        assert_eq!(year.num_winners, 2);
        assert_eq!(year.num_losers, 1);
        assert_eq!(year.big_winner, dec!(250));
        assert_eq!(year.big_loser, dec!(-120));
        assert_eq!(year.winners_profit, dec!(330));
        assert_eq!(year.losers_loss, dec!(-120));
        assert_eq!(year.pct_winners, 66.67);
    }

    #[test]
    fn test_daily_interval_spans_gap_days() {
        let trades = vec![
            trade(ts(2018, 6, 1), Some(ts(2018, 6, 4)), Some(dec!(10))),
        ];

        let stats = StatisticsCalculator::calculate(&trades, StatisticsInterval::Day);
        // 6月1日到6月4日，包含中间没有活动的两天
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[1].num_opened, 0);
        assert_eq!(stats[1].num_closed, 0);
        assert_eq!(stats[3].num_closed, 1);
    }

    #[test]
    fn test_cache_tail() {
        let calculator = StatisticsCalculator::new();
        let filter = StatisticsFilter::default();
        let trades = vec![
            trade(ts(2018, 6, 1), Some(ts(2018, 6, 4)), Some(dec!(10))),
        ];
        let stats = StatisticsCalculator::calculate(&trades, StatisticsInterval::Day);

        assert!(calculator
            .cached(StatisticsInterval::Day, &filter, None)
            .is_none());

        let tail = calculator.store(StatisticsInterval::Day, &filter, stats, Some(2));
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].id, 4);

        let cached = calculator
            .cached(StatisticsInterval::Day, &filter, None)
            .unwrap();
        assert_eq!(cached.len(), 4);

        calculator.invalidate();
        assert!(calculator
            .cached(StatisticsInterval::Day, &filter, None)
            .is_none());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.66666), 66.67);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(33.333), 33.33);
    }
}
