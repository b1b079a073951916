//! 传感器读数内存存储实现
//!
//! 仅用于本地演示和测试。
//!
//! 事务语义：写锁内直接在状态上执行三个步骤，同时记录撤销日志；
//! 任一步失败则按逆序撤销已执行的步骤并恢复 ID 计数器，等价于回滚。

use crate::error::StorageError;
use crate::models::{
    DeviceRecord, ProfileUpdatePolicy, SensorReadingRecord, StoredReading, UserRecord,
    payload_text,
};
use crate::traits::SensorDataStore;
use crate::validation::ensure_reading_input;
use chrono::{DateTime, Utc};
use domain::{AuthIdentity, DeviceIdentity, SensorReadingInput};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// 单个步骤的撤销动作。
enum Undo {
    RemoveUser,
    RestoreUser(usize, UserRecord),
    RemoveDevice,
    RestoreDevice(usize, DeviceRecord),
}

#[derive(Debug, Default)]
struct State {
    users: Vec<UserRecord>,
    user_index: HashMap<String, usize>,
    devices: Vec<DeviceRecord>,
    device_index: HashMap<(i64, String), usize>,
    readings: Vec<SensorReadingRecord>,
    next_user_id: i64,
    next_device_id: i64,
    next_reading_id: i64,
}

impl State {
    fn upsert_user(
        &mut self,
        identity: &AuthIdentity,
        policy: ProfileUpdatePolicy,
        undo: &mut Vec<Undo>,
    ) -> i64 {
        if let Some(&index) = self.user_index.get(&identity.subject_id) {
            let user = &mut self.users[index];
            undo.push(Undo::RestoreUser(index, user.clone()));
            match policy {
                ProfileUpdatePolicy::Overwrite => {
                    user.email = identity.email.clone();
                    user.display_name = identity.display_name.clone();
                }
                ProfileUpdatePolicy::Coalesce => {
                    if identity.email.is_some() {
                        user.email = identity.email.clone();
                    }
                    if identity.display_name.is_some() {
                        user.display_name = identity.display_name.clone();
                    }
                }
            }
            return user.id;
        }

        self.next_user_id += 1;
        let id = self.next_user_id;
        self.user_index
            .insert(identity.subject_id.clone(), self.users.len());
        self.users.push(UserRecord {
            id,
            subject_id: identity.subject_id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
        });
        undo.push(Undo::RemoveUser);
        id
    }

    fn upsert_device(
        &mut self,
        user_id: i64,
        device: &DeviceIdentity,
        now: DateTime<Utc>,
        undo: &mut Vec<Undo>,
    ) -> i64 {
        let name = device
            .name
            .as_ref()
            .filter(|name| !name.trim().is_empty())
            .cloned();
        let key = (user_id, device.external_id.clone());
        if let Some(&index) = self.device_index.get(&key) {
            let existing = &mut self.devices[index];
            undo.push(Undo::RestoreDevice(index, existing.clone()));
            if name.is_some() {
                existing.name = name;
            }
            existing.last_seen_at = now;
            return existing.id;
        }

        self.next_device_id += 1;
        let id = self.next_device_id;
        self.device_index.insert(key, self.devices.len());
        self.devices.push(DeviceRecord {
            id,
            user_id,
            external_id: device.external_id.clone(),
            name,
            last_seen_at: now,
        });
        undo.push(Undo::RemoveDevice);
        id
    }

    fn insert_reading(&mut self, device_id: i64, recorded_at: DateTime<Utc>, payload: String) -> i64 {
        self.next_reading_id += 1;
        let id = self.next_reading_id;
        self.readings.push(SensorReadingRecord {
            id,
            device_id,
            recorded_at,
            payload,
        });
        id
    }

    /// 逆序执行撤销日志。
    fn rollback(&mut self, undo: Vec<Undo>, counters: (i64, i64, i64)) {
        for action in undo.into_iter().rev() {
            match action {
                Undo::RemoveUser => {
                    if let Some(user) = self.users.pop() {
                        self.user_index.remove(&user.subject_id);
                    }
                }
                Undo::RestoreUser(index, record) => self.users[index] = record,
                Undo::RemoveDevice => {
                    if let Some(device) = self.devices.pop() {
                        self.device_index
                            .remove(&(device.user_id, device.external_id));
                    }
                }
                Undo::RestoreDevice(index, record) => self.devices[index] = record,
            }
        }
        (self.next_user_id, self.next_device_id, self.next_reading_id) = counters;
    }
}

/// 传感器读数内存存储
///
/// 使用 RwLock 提供线程安全的内存存储。
pub struct InMemorySensorDataStore {
    state: RwLock<State>,
    profile_policy: ProfileUpdatePolicy,
    fail_reading_insert: AtomicBool,
}

impl InMemorySensorDataStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            profile_policy: ProfileUpdatePolicy::default(),
            fail_reading_insert: AtomicBool::new(false),
        }
    }

    pub fn with_profile_policy(mut self, policy: ProfileUpdatePolicy) -> Self {
        self.profile_policy = policy;
        self
    }

    /// 模拟存储故障：开启后读数写入步骤失败（用户、设备步骤已在副本上执行）。
    pub fn set_reading_insert_failure(&self, enabled: bool) {
        self.fail_reading_insert.store(enabled, Ordering::SeqCst);
    }

    /// 当前用户快照（用于测试）。
    pub fn users(&self) -> Vec<UserRecord> {
        self.state
            .read()
            .map(|state| state.users.clone())
            .unwrap_or_default()
    }

    /// 当前设备快照（用于测试）。
    pub fn devices(&self) -> Vec<DeviceRecord> {
        self.state
            .read()
            .map(|state| state.devices.clone())
            .unwrap_or_default()
    }

    /// 当前读数快照（用于测试）。
    pub fn readings(&self) -> Vec<SensorReadingRecord> {
        self.state
            .read()
            .map(|state| state.readings.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemorySensorDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SensorDataStore for InMemorySensorDataStore {
    async fn store_reading(
        &self,
        input: &SensorReadingInput,
    ) -> Result<StoredReading, StorageError> {
        ensure_reading_input(input)?;
        let payload = payload_text(&input.reading.payload)?;
        let now = Utc::now();

        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Unavailable("lock failed".to_string()))?;
        let counters = (state.next_user_id, state.next_device_id, state.next_reading_id);
        let mut undo = Vec::with_capacity(2);

        let user_id = state.upsert_user(&input.identity, self.profile_policy, &mut undo);
        let device_id = state.upsert_device(user_id, &input.device, now, &mut undo);
        if self.fail_reading_insert.load(Ordering::SeqCst) {
            state.rollback(undo, counters);
            return Err(StorageError::Unavailable(
                "simulated reading insert failure".to_string(),
            ));
        }
        let reading_id = state.insert_reading(device_id, input.reading.recorded_at, payload);

        Ok(StoredReading {
            user_id,
            device_id,
            reading_id,
        })
    }
}
