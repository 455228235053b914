// air_aura - Alert aggregation service for the Air Aura dashboard
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use air_aura::alert::{Alert, AlertKind};
use air_aura::banner::{Banner, BannerState};
use air_aura::context::AlertContext;
use air_aura::notifier::AlertNotifier;
use air_aura::summary::AlertSummary;
use serde_json::json;
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(1000);

fn flood(severity: &str) -> Alert {
    Alert::try_from(json!({
        "id": "d-1",
        "type": "flood",
        "severity": severity,
        "title": "Enchente",
        "description": "Nível do rio subindo",
        "location": "Porto Alegre",
        "distance": 3.2,
        "affectedRadius": 15.0,
        "source": "Defesa Civil",
        "createdAt": "2024-05-03T09:30:00Z",
        "isActive": true
    }))
    .unwrap()
}

fn respiratory(risk: &str) -> Alert {
    Alert::try_from(json!({
        "id": "h-1",
        "condition": {
            "id": "asthma",
            "name": "Asma",
            "severity": "high",
            "affectedSystems": ["respiratory"]
        },
        "riskLevel": risk,
        "title": "Risco respiratório elevado",
        "description": "Concentração de PM2.5 acima do recomendado",
        "recommendations": ["Evite exercícios ao ar livre"],
        "affectedBy": {
            "airQuality": { "aqi": 210, "dominantPollutant": "pm25", "pm25": 160.4 },
            "weather": { "temperature": 31.0, "humidity": 22.0 }
        },
        "createdAt": "2024-05-03T09:30:00Z",
        "isActive": true
    }))
    .unwrap()
}

fn untyped() -> Alert {
    Alert::try_from(json!({ "id": "u-1", "title": "Aviso" })).unwrap()
}

/// Let the notifier task observe whatever changed.
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_totals_and_partitions() {
    let lists = vec![
        vec![],
        vec![flood("low")],
        vec![flood("high"), respiratory("medium"), untyped()],
        vec![untyped(), untyped()],
        vec![respiratory("critical"), respiratory("low"), flood("critical")],
    ];

    for alerts in lists {
        let summary = AlertSummary::from_alerts(&alerts);
        let critical = alerts.iter().any(|a| a.level().map(|l| l.is_critical()).unwrap_or(false));
        let untagged = alerts.iter().filter(|a| a.kind() == AlertKind::Unclassified).count();

        assert_eq!(alerts.len(), summary.total_alerts);
        assert_eq!(critical, summary.has_critical_alerts);
        assert!(summary.disaster_alerts.len() + summary.health_alerts.len() <= alerts.len());
        assert_eq!(
            alerts.len() - untagged,
            summary.disaster_alerts.len() + summary.health_alerts.len()
        );
    }
}

#[test]
fn test_empty_list() {
    let ctx = AlertContext::new();
    let alerts = ctx.alerts();
    let summary = AlertSummary::from_alerts(&alerts);

    assert_eq!(0, summary.total_alerts);
    assert!(!summary.has_critical_alerts);
    assert_eq!(BannerState::Hidden, Banner::new(ctx).state());
}

#[test]
fn test_single_high_flood() {
    let ctx = AlertContext::with_alerts(vec![flood("high")]);
    let alerts = ctx.alerts();
    let summary = AlertSummary::from_alerts(&alerts);

    assert_eq!(1, summary.total_alerts);
    assert_eq!(1, summary.disaster_alerts.len());
    assert!(!summary.has_critical_alerts);

    match Banner::new(ctx).state() {
        BannerState::Visible(content) => assert_eq!("1 alerta ativo", content.message),
        BannerState::Hidden => panic!("expected a visible banner"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_critical_health_alert_opens_modal_once() {
    let ctx = AlertContext::new();
    let notifier = AlertNotifier::new(ctx.clone(), DELAY);
    let auto_opens = notifier.auto_open_counter();
    let task = tokio::spawn(notifier.run());
    settle().await;

    ctx.replace_alerts(vec![respiratory("critical")]);
    settle().await;
    assert!(!ctx.is_modal_open());

    tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
    settle().await;
    assert!(ctx.is_modal_open());

    tokio::time::sleep(DELAY * 5).await;
    assert_eq!(1, auto_opens.get());

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_rapid_updates_open_modal_at_most_once() {
    let ctx = AlertContext::new();
    let notifier = AlertNotifier::new(ctx.clone(), DELAY);
    let auto_opens = notifier.auto_open_counter();
    let task = tokio::spawn(notifier.run());
    settle().await;

    ctx.replace_alerts(vec![flood("critical")]);
    settle().await;
    tokio::time::sleep(DELAY / 3).await;

    ctx.replace_alerts(vec![flood("critical"), respiratory("critical")]);
    settle().await;
    tokio::time::sleep(DELAY / 3).await;
    assert_eq!(0, auto_opens.get());

    tokio::time::sleep(DELAY * 5).await;
    assert!(ctx.is_modal_open());
    assert_eq!(1, auto_opens.get());

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_modal_opened_by_user_cancels_auto_open() {
    let ctx = AlertContext::new();
    let notifier = AlertNotifier::new(ctx.clone(), DELAY);
    let auto_opens = notifier.auto_open_counter();
    let task = tokio::spawn(notifier.run());
    settle().await;

    ctx.replace_alerts(vec![flood("critical")]);
    settle().await;
    ctx.show_alerts();
    settle().await;

    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(0, auto_opens.get());

    task.abort();
}

#[test]
fn test_dismissed_banner_stays_hidden() {
    let ctx = AlertContext::with_alerts(vec![flood("high"), respiratory("low")]);
    let mut banner = Banner::new(ctx.clone());
    assert!(banner.state().is_visible());

    banner.dismiss();
    assert_eq!(BannerState::Hidden, banner.state());
    assert_eq!(2, AlertSummary::from_alerts(&ctx.alerts()).total_alerts);

    // Remount
    let banner = Banner::new(ctx);
    assert!(banner.state().is_visible());
}

#[tokio::test]
async fn test_scoped_consumers() {
    assert!(Banner::from_scope().is_err());
    assert!(AlertNotifier::from_scope(DELAY).is_err());

    let ctx = AlertContext::with_alerts(vec![flood("high")]);
    let visible = ctx
        .provide(async { Banner::from_scope().map(|b| b.state().is_visible()) })
        .await;

    assert_eq!(Ok(true), visible);
}
