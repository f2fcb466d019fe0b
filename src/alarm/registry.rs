use chrono::NaiveDate;
use tracing::{debug, info};

use crate::alarm::model::{Alarm, AlarmId};
use crate::error::{EngineError, EngineResult};
use crate::time_of_day::TimeOfDay;

/// Sole owner of the alarm set.
///
/// The backing vector is kept sorted ascending by [`TimeOfDay`] and holds at
/// most one alarm per time of day. Uniqueness is on the time, not the id.
#[derive(Debug)]
pub struct AlarmRegistry {
    alarms: Vec<Alarm>,
    next_id: u64,
}

impl AlarmRegistry {
    pub fn new() -> Self {
        Self {
            alarms: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add(&mut self, time: TimeOfDay) -> EngineResult<Alarm> {
        self.add_with_state(time, true)
    }

    pub fn add_with_state(&mut self, time: TimeOfDay, active: bool) -> EngineResult<Alarm> {
        // Structural range check at the registry boundary.
        let time = TimeOfDay::new(time.hour(), time.minute(), time.second())?;
        let position = match self.alarms.binary_search_by_key(&time, |alarm| alarm.time) {
            Ok(_) => return Err(EngineError::DuplicateAlarm { time }),
            Err(position) => position,
        };

        let alarm = Alarm {
            id: self.allocate_id(),
            time,
            active,
            last_fired_date: None,
        };
        self.alarms.insert(position, alarm.clone());
        info!(id = %alarm.id, %time, active, "alarm added");
        Ok(alarm)
    }

    pub fn toggle(&mut self, id: AlarmId) -> EngineResult<&Alarm> {
        let alarm = self.find_mut(id)?;
        alarm.active = !alarm.active;
        info!(%id, active = alarm.active, "alarm toggled");
        Ok(alarm)
    }

    pub fn remove(&mut self, id: AlarmId) -> EngineResult<Alarm> {
        let index = self.index_of(id)?;
        let removed = self.alarms.remove(index);
        info!(%id, time = %removed.time, "alarm removed");
        Ok(removed)
    }

    pub fn mark_fired(&mut self, id: AlarmId, date: NaiveDate) -> EngineResult<()> {
        let alarm = self.find_mut(id)?;
        alarm.last_fired_date = Some(date);
        debug!(%id, %date, "alarm marked fired");
        Ok(())
    }

    pub fn list(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|alarm| alarm.id == id)
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    fn allocate_id(&mut self) -> AlarmId {
        let id = AlarmId(self.next_id);
        self.next_id += 1;
        id
    }

    fn index_of(&self, id: AlarmId) -> EngineResult<usize> {
        self.alarms
            .iter()
            .position(|alarm| alarm.id == id)
            .ok_or(EngineError::NotFound { id })
    }

    fn find_mut(&mut self, id: AlarmId) -> EngineResult<&mut Alarm> {
        self.alarms
            .iter_mut()
            .find(|alarm| alarm.id == id)
            .ok_or(EngineError::NotFound { id })
    }
}

impl Default for AlarmRegistry {
    fn default() -> Self {
        Self::new()
    }
}
