// src/player/transport.rs

use super::session::{PlaybackSession, PlaybackState};
use crate::{constants, error::*, symbols, ui, utils};
use colored::Colorize;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    terminal,
    tty::IsTty,
};
use futures::StreamExt;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy)]
pub struct TransportOutcome {
    pub completed: bool,
    pub position: f64,
}

/// 终端没有内嵌媒体面，实际画面交给浏览器；
/// 这里保留的是传输控制面板: 播放会话状态机 + 1 秒前台时钟。
const KEY_HELP: &str = "空格=播放/暂停  ←/→=快退/快进5s  ↑/↓=音量  m=静音  r=倍速  f=全屏  q=关闭";

/// 运行一次交互式播放会话，返回是否播放完成。
/// 会话在进入时自动开始播放（打开即播放）。
pub async fn run_transport(
    title: &str,
    media_url: &str,
    session: &mut PlaybackSession,
) -> AppResult<TransportOutcome> {
    ui::box_message(
        &format!("正在播放: {}", utils::truncate_text(title, constants::TITLE_TRUNCATE_LENGTH)),
        &["在浏览器中打开媒体地址:", "", media_url, "", KEY_HELP],
        |s| s.cyan(),
    );

    if !std::io::stdin().is_tty() {
        warn!("stdin 不是终端，无法进入播放控制，跳过会话");
        ui::warn("当前环境不支持交互式播放控制，已跳过播放。");
        return Ok(TransportOutcome {
            completed: false,
            position: session.position(),
        });
    }

    let pbar = ui::new_playback_bar(session.duration());

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard;

    let mut events = EventStream::new();
    // 首拍延后一秒，避免刚打开就把时钟拨快
    let mut ticker = tokio::time::interval_at(
        Instant::now() + Duration::from_secs(1),
        Duration::from_secs(1),
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    session.play();
    info!("播放会话开始: '{}' ({:?})", title, session.kind());
    let mut completed = false;

    loop {
        pbar.set_position(session.position().round() as u64);
        pbar.set_message(status_line(session));

        tokio::select! {
            _ = ticker.tick() => {
                if session.tick(1.0).is_some() {
                    completed = true;
                    break;
                }
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL)
                        {
                            return Err(AppError::UserInterrupt);
                        }
                        match key.code {
                            KeyCode::Char(' ') => session.toggle_play(),
                            KeyCode::Left | KeyCode::Right => {
                                let delta = if key.code == KeyCode::Left {
                                    -constants::SEEK_STEP_SECS
                                } else {
                                    constants::SEEK_STEP_SECS
                                };
                                if session.seek_by(delta).is_some() {
                                    completed = true;
                                    break;
                                }
                            }
                            KeyCode::Up => session.volume_up(),
                            KeyCode::Down => session.volume_down(),
                            KeyCode::Char('m') => session.toggle_mute(),
                            KeyCode::Char('f') => session.toggle_fullscreen(),
                            KeyCode::Char('r') => session.cycle_rate(),
                            KeyCode::Char('q') | KeyCode::Esc => break,
                            other => debug!("忽略按键: {:?}", other),
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("读取终端事件失败，关闭播放会话: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    pbar.finish_and_clear();
    drop(_guard);

    if completed {
        println!("{} 播放完成: {}", *symbols::DONE, title.green());
        info!("播放会话完成: '{}'", title);
    } else {
        info!(
            "播放会话关闭 (未完成): '{}' @ {:.0}s",
            title,
            session.position()
        );
    }

    Ok(TransportOutcome {
        completed,
        position: session.position(),
    })
}

fn status_line(session: &PlaybackSession) -> String {
    let state = match session.state() {
        PlaybackState::Playing => "▶",
        PlaybackState::Paused => "⏸",
        PlaybackState::Idle => "·",
        PlaybackState::Completed => "✓",
    };
    let mute = if session.is_muted() { " 静音" } else { "" };
    let full = if session.is_fullscreen() { " 全屏" } else { "" };
    format!(
        "{} x{} 音量{:.0}%{}{}",
        state,
        session.rate(),
        session.volume() * 100.0,
        mute,
        full
    )
}

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
