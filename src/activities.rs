//! Activity planning from a daily forecast
//!
//! The planner is the last stage of the scheduled pipeline. An LLM-backed
//! planner feeds [`planning_prompt`] to its model; [`LocalPlanner`] is a
//! deterministic rule-based planner used when no model is wired in.

use async_trait::async_trait;

use crate::data::conditions::is_severe_condition;
use crate::data::DailyForecast;
use crate::error::Result;

/// Precipitation chance (percent) above which indoor plans take priority
pub const INDOOR_PRECIPITATION_THRESHOLD: f64 = 50.0;

/// Produces activity suggestions from a daily forecast
///
/// Implementations return free text; callers pass it through unchanged.
#[async_trait]
pub trait ActivityPlanner: Send + Sync {
    /// Generate suggestions for the forecast
    async fn generate(&self, forecast: &DailyForecast) -> Result<String>;
}

/// Render the activity planning prompt for a language model
pub fn planning_prompt(forecast: &DailyForecast) -> Result<String> {
    let forecast_json = serde_json::to_string_pretty(forecast)?;

    Ok(format!(
        "{location}の以下の天気予報に基づいて、適切なアクティビティを提案してください：
{forecast_json}
予報の各日について、以下の形式で正確に回答してください：

📅 [曜日、月 日、年]
═══════════════════════════

🌡️ 天気の概要
• 天候：[簡潔な説明]
• 気温：[X°C から A°C]
• 降水確率：[X%]

🌅 午前中のアクティビティ
屋外：
• [アクティビティ名] - [具体的な場所/ルートを含む簡潔な説明]
  最適な時間帯：[具体的な時間帯]
  注意：[関連する天気の考慮事項]

🌞 午後のアクティビティ
屋外：
• [アクティビティ名] - [具体的な場所/ルートを含む簡潔な説明]
  最適な時間帯：[具体的な時間帯]
  注意：[関連する天気の考慮事項]

🏠 屋内の代替案
• [アクティビティ名] - [具体的な会場を含む簡潔な説明]
  最適な条件：[この代替案が適している天候]

⚠️ 特別な注意事項
• [関連する天気警報、UV指数、風の状況など]

ガイドライン：
- 1日あたり2〜3つの時間指定された屋外アクティビティを提案してください
- 1〜2つの屋内の代替案を含めてください
- 降水確率が{threshold}%を超える場合は、屋内アクティビティを優先してください
- すべてのアクティビティは、その地域に特有のものでなければなりません
- 具体的な会場、トレイル、場所を含めてください
- 気温に基づいてアクティビティの強度を考慮してください
- 簡潔で有益な説明を心がけてください

一貫性を保つため、絵文字とセクションヘッダーを示されたとおりに使用してください。",
        location = forecast.location,
        forecast_json = forecast_json,
        threshold = INDOOR_PRECIPITATION_THRESHOLD,
    ))
}

/// Activities the local planner can suggest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Hiking or trail walking
    Hiking,
    /// Cycling
    Cycling,
    /// A walk in a park or along a river
    Walking,
    /// Swimming or a trip to the water
    Swimming,
    /// Museum or gallery visit
    Museum,
    /// Hot spring or public bath
    Onsen,
    /// Cafe or shopping
    Cafe,
}

/// Where an activity takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Outdoor,
    Indoor,
}

impl Activity {
    /// Returns a slice containing all activity variants.
    pub fn all() -> &'static [Activity] {
        &[
            Activity::Hiking,
            Activity::Cycling,
            Activity::Walking,
            Activity::Swimming,
            Activity::Museum,
            Activity::Onsen,
            Activity::Cafe,
        ]
    }

    /// Returns a human-readable display label for the activity.
    pub fn label(&self) -> &'static str {
        match self {
            Activity::Hiking => "ハイキング",
            Activity::Cycling => "サイクリング",
            Activity::Walking => "公園散策",
            Activity::Swimming => "水遊び・プール",
            Activity::Museum => "美術館・博物館",
            Activity::Onsen => "温泉・銭湯",
            Activity::Cafe => "カフェ・ショッピング",
        }
    }

    /// Indoor or outdoor
    pub fn setting(&self) -> Setting {
        match self {
            Activity::Museum | Activity::Onsen | Activity::Cafe => Setting::Indoor,
            _ => Setting::Outdoor,
        }
    }

    /// Ideal temperature range in Celsius (min, max)
    pub fn ideal_temperature(&self) -> (f64, f64) {
        match self {
            Activity::Hiking => (10.0, 24.0),
            Activity::Cycling => (12.0, 26.0),
            Activity::Walking => (8.0, 28.0),
            Activity::Swimming => (26.0, 35.0),
            Activity::Museum | Activity::Cafe => (-10.0, 40.0),
            Activity::Onsen => (-10.0, 18.0),
        }
    }

    /// Score temperature based on ideal range.
    /// Returns 1.0 when in ideal range, scales down to 0.0 when 5+ degrees outside.
    pub fn score_temperature(&self, temp: f64) -> f64 {
        let (min, max) = self.ideal_temperature();
        if temp < min - 5.0 || temp > max + 5.0 {
            0.0
        } else if temp >= min && temp <= max {
            1.0
        } else if temp < min {
            ((temp - (min - 5.0)) / 5.0).clamp(0.0, 1.0)
        } else {
            ((max + 5.0 - temp) / 5.0).clamp(0.0, 1.0)
        }
    }

    /// Score the whole day: both ends of the temperature range must suit
    pub fn score_forecast(&self, forecast: &DailyForecast) -> f64 {
        let temperature = self
            .score_temperature(forecast.max_temp)
            .min(self.score_temperature(forecast.min_temp));
        match self.setting() {
            Setting::Indoor => temperature,
            Setting::Outdoor => temperature * (1.0 - forecast.precipitation_chance / 100.0),
        }
    }

    /// Reason this activity is unsuitable, if any
    pub fn check_sanity_gates(&self, forecast: &DailyForecast) -> Option<String> {
        if self.setting() == Setting::Indoor {
            return None;
        }
        if is_severe_condition(&forecast.condition) {
            return Some(format!("{}のため屋外は危険です", forecast.condition));
        }
        if forecast.precipitation_chance > INDOOR_PRECIPITATION_THRESHOLD {
            return Some(format!(
                "降水確率{:.0}%のため屋内を優先します",
                forecast.precipitation_chance
            ));
        }
        if *self == Activity::Swimming && forecast.max_temp < 25.0 {
            return Some(format!("最高気温{:.1}°Cでは水遊びには寒すぎます", forecast.max_temp));
        }
        None
    }
}

/// Rule-based planner that ranks activities by forecast suitability
#[derive(Debug, Clone)]
pub struct LocalPlanner {
    /// Maximum outdoor suggestions
    pub max_outdoor: usize,
    /// Maximum indoor suggestions
    pub max_indoor: usize,
}

impl Default for LocalPlanner {
    fn default() -> Self {
        Self {
            max_outdoor: 3,
            max_indoor: 2,
        }
    }
}

impl LocalPlanner {
    /// Ranked activities for one setting, skipping blocked and zero-score ones
    pub fn rank(&self, forecast: &DailyForecast, setting: Setting) -> Vec<(Activity, f64)> {
        let mut ranked: Vec<(Activity, f64)> = Activity::all()
            .iter()
            .filter(|a| a.setting() == setting)
            .filter(|a| a.check_sanity_gates(forecast).is_none())
            .map(|a| (*a, a.score_forecast(forecast)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Render suggestions as text
    pub fn render(&self, forecast: &DailyForecast) -> String {
        let mut lines = vec![
            format!("📅 {}", forecast.date.format("%Y-%m-%d")),
            format!("📍 {}", forecast.location),
            String::new(),
            "🌡️ 天気の概要".to_string(),
            format!("• 天候：{}", forecast.condition),
            format!("• 気温：{:.1}°C から {:.1}°C", forecast.min_temp, forecast.max_temp),
            format!("• 降水確率：{:.0}%", forecast.precipitation_chance),
            String::new(),
        ];

        let outdoor: Vec<_> = self
            .rank(forecast, Setting::Outdoor)
            .into_iter()
            .take(self.max_outdoor)
            .collect();
        let indoor: Vec<_> = self
            .rank(forecast, Setting::Indoor)
            .into_iter()
            .take(self.max_indoor)
            .collect();

        let prefer_indoor = outdoor.is_empty();
        let sections = if prefer_indoor {
            [("🏠 屋内のおすすめ", &indoor), ("🌳 屋外", &outdoor)]
        } else {
            [("🌳 屋外のおすすめ", &outdoor), ("🏠 屋内の代替案", &indoor)]
        };

        for (title, activities) in sections {
            if activities.is_empty() {
                continue;
            }
            lines.push(title.to_string());
            for (activity, score) in activities {
                lines.push(format!("• {} (適性 {:.0}%)", activity.label(), score * 100.0));
            }
            lines.push(String::new());
        }

        let warnings: Vec<String> = Activity::all()
            .iter()
            .filter_map(|a| a.check_sanity_gates(forecast))
            .fold(Vec::new(), |mut acc, reason| {
                if !acc.contains(&reason) {
                    acc.push(reason);
                }
                acc
            });
        if !warnings.is_empty() {
            lines.push("⚠️ 特別な注意事項".to_string());
            lines.extend(warnings.into_iter().map(|w| format!("• {}", w)));
        }

        lines.join("\n").trim_end().to_string()
    }
}

#[async_trait]
impl ActivityPlanner for LocalPlanner {
    async fn generate(&self, forecast: &DailyForecast) -> Result<String> {
        Ok(self.render(forecast))
    }
}
