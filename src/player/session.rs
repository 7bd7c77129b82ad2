// src/player/session.rs

use crate::constants;

/// 单次播放会话的状态机: idle → playing ⇄ paused → completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Completed,
}

/// 完成判定策略按媒体来源区分:
/// - Native: 播放位置到达 (时长 - 1秒) 即完成，快进跳到结尾同样触发
/// - Youtube: 嵌入播放器自走进度，这里靠前台 1 秒计时器累计观看秒数，
///   累计值到达时长才完成，快进不会推进累计值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Native,
    Youtube,
}

/// 完成事件。每个会话至多发射一次，是接入进度上报的唯一信号。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionEvent {
    pub position: f64,
}

#[derive(Debug, Clone)]
pub struct PlaybackSession {
    kind: MediaKind,
    /// 媒体时长（秒）。终端侧无法探测远端媒体元数据，
    /// 时长未知时完成检测不可用。
    duration: Option<f64>,
    state: PlaybackState,
    position: f64,
    watched_secs: f64,
    rate_index: usize,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    completion_fired: bool,
}

impl PlaybackSession {
    pub fn new(kind: MediaKind, duration: Option<f64>) -> Self {
        Self {
            kind,
            duration: duration.filter(|d| *d > 0.0),
            state: PlaybackState::Idle,
            position: 0.0,
            watched_secs: 0.0,
            rate_index: constants::DEFAULT_RATE_INDEX,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            completion_fired: false,
        }
    }

    /// 重新打开同一媒体: 回到 idle、位置清零、完成标记复位。
    /// 音量与速率属于用户偏好，保留。
    pub fn reopen(&mut self) {
        self.state = PlaybackState::Idle;
        self.position = 0.0;
        self.watched_secs = 0.0;
        self.completion_fired = false;
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn rate(&self) -> f64 {
        constants::PLAYBACK_RATES[self.rate_index]
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn play(&mut self) {
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Paused) {
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn toggle_play(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            _ => self.play(),
        }
    }

    /// 前台时钟驱动。dt 为自上次 tick 以来经过的真实秒数。
    pub fn tick(&mut self, dt: f64) -> Option<CompletionEvent> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        match self.kind {
            MediaKind::Native => {
                self.position += dt * self.rate();
            }
            MediaKind::Youtube => {
                // 嵌入播放器自己走进度，这里只做轮询式镜像与观看累计
                self.position += dt;
                self.watched_secs += dt;
            }
        }
        if let Some(d) = self.duration
            && self.position > d
        {
            self.position = d;
        }
        self.check_completion()
    }

    /// 相对当前播放位置快进/快退。原生媒体跳到结尾附近同样会判完成；
    /// YouTube 的观看累计不受快进影响。
    pub fn seek_by(&mut self, delta: f64) -> Option<CompletionEvent> {
        if self.state == PlaybackState::Completed {
            return None;
        }
        self.position = (self.position + delta).max(0.0);
        if let Some(d) = self.duration
            && self.position > d
        {
            self.position = d;
        }
        match self.kind {
            MediaKind::Native => self.check_completion(),
            MediaKind::Youtube => None,
        }
    }

    pub fn cycle_rate(&mut self) {
        self.rate_index = (self.rate_index + 1) % constants::PLAYBACK_RATES.len();
    }

    pub fn volume_up(&mut self) {
        self.volume = (self.volume + constants::VOLUME_STEP).min(1.0);
    }

    pub fn volume_down(&mut self) {
        self.volume = (self.volume - constants::VOLUME_STEP).max(0.0);
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    fn check_completion(&mut self) -> Option<CompletionEvent> {
        if self.completion_fired {
            return None;
        }
        let duration = self.duration?;
        let done = match self.kind {
            MediaKind::Native => self.position >= duration - constants::COMPLETION_TAIL_SECS,
            MediaKind::Youtube => self.watched_secs >= duration,
        };
        if !done {
            return None;
        }
        self.completion_fired = true;
        self.state = PlaybackState::Completed;
        Some(CompletionEvent {
            position: self.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_completes_one_second_before_end() {
        let mut s = PlaybackSession::new(MediaKind::Native, Some(100.0));
        s.play();
        assert_eq!(s.tick(98.0), None);
        let event = s.tick(1.0).expect("到达 时长-1 应触发完成");
        assert!(event.position >= 99.0);
        assert_eq!(s.state(), PlaybackState::Completed);
        // 完成事件只发射一次
        assert_eq!(s.tick(1.0), None);
        assert_eq!(s.seek_by(10.0), None);
    }

    #[test]
    fn test_native_rate_scales_position_advance() {
        let mut s = PlaybackSession::new(MediaKind::Native, Some(100.0));
        s.play();
        s.cycle_rate(); // 1.0 -> 1.25
        s.tick(4.0);
        assert!((s.position() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_native_seek_to_tail_triggers_completion() {
        // 快进跳到结尾附近同样算完成，无须真实观看
        let mut s = PlaybackSession::new(MediaKind::Native, Some(100.0));
        s.play();
        let event = s.seek_by(99.5);
        assert!(event.is_some());
        assert_eq!(s.state(), PlaybackState::Completed);
    }

    #[test]
    fn test_youtube_accumulates_only_while_playing() {
        let mut s = PlaybackSession::new(MediaKind::Youtube, Some(10.0));
        s.play();
        for _ in 0..5 {
            assert_eq!(s.tick(1.0), None);
        }
        s.pause();
        // 暂停期间计时器不前进
        for _ in 0..30 {
            assert_eq!(s.tick(1.0), None);
        }
        s.play();
        for _ in 0..4 {
            assert_eq!(s.tick(1.0), None);
        }
        assert!(s.tick(1.0).is_some());
        assert_eq!(s.state(), PlaybackState::Completed);
    }

    #[test]
    fn test_youtube_seek_does_not_advance_accumulator() {
        let mut s = PlaybackSession::new(MediaKind::Youtube, Some(10.0));
        s.play();
        assert_eq!(s.seek_by(9.9), None);
        assert!(s.position() > 9.0);
        // 仍需累计满 10 秒才完成
        for _ in 0..9 {
            assert_eq!(s.tick(1.0), None);
        }
        assert!(s.tick(1.0).is_some());
    }

    #[test]
    fn test_reopen_resets_position_and_completion() {
        let mut s = PlaybackSession::new(MediaKind::Native, Some(60.0));
        s.play();
        s.tick(59.5);
        assert_eq!(s.state(), PlaybackState::Completed);

        s.reopen();
        assert_eq!(s.state(), PlaybackState::Idle);
        assert_eq!(s.position(), 0.0);
        // 复位后可以再次完成播放
        s.play();
        assert!(s.tick(59.5).is_some());
    }

    #[test]
    fn test_unknown_duration_never_completes() {
        let mut s = PlaybackSession::new(MediaKind::Native, None);
        s.play();
        assert_eq!(s.tick(3600.0), None);
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_volume_and_mute_bounds() {
        let mut s = PlaybackSession::new(MediaKind::Native, Some(10.0));
        for _ in 0..20 {
            s.volume_up();
        }
        assert_eq!(s.volume(), 1.0);
        for _ in 0..20 {
            s.volume_down();
        }
        assert_eq!(s.volume(), 0.0);
        s.toggle_mute();
        assert!(s.is_muted());
        s.toggle_mute();
        assert!(!s.is_muted());
    }
}
