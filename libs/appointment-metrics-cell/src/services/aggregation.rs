// libs/appointment-metrics-cell/src/services/aggregation.rs
use std::collections::HashSet;

use crate::models::{
    Appointment, AppointmentSummary, ProviderAssignment, ProviderResponse, ServiceStatusCount,
};

/// Sum of `status_key` across every summary. Missing keys count as zero.
pub fn service_count_by_type(summaries: &[AppointmentSummary], status_key: &str) -> u64 {
    summaries.iter().map(|summary| summary.count(status_key)).sum()
}

/// One record per (service, status category), in summary order.
pub fn flatten_summary(summaries: &[AppointmentSummary]) -> Vec<ServiceStatusCount> {
    summaries
        .iter()
        .flat_map(|summary| {
            summary.counts.iter().map(move |(status, count)| ServiceStatusCount {
                service_uuid: summary.service_uuid.clone(),
                service_name: summary.service_name.clone(),
                status: status.clone(),
                count: *count,
            })
        })
        .collect()
}

/// The record with the largest count; the earliest one wins a tie.
pub fn highest_service_load(flattened: &[ServiceStatusCount]) -> Option<ServiceStatusCount> {
    // Iterator::max_by_key keeps the last maximum, so fold by hand.
    flattened
        .iter()
        .fold(None::<&ServiceStatusCount>, |best, candidate| match best {
            Some(current) if current.count >= candidate.count => Some(current),
            _ => Some(candidate),
        })
        .cloned()
}

/// Accepted provider assignments, first occurrence of each provider uuid.
pub fn unique_accepted_providers(appointments: &[Appointment]) -> Vec<&ProviderAssignment> {
    let mut seen = HashSet::new();
    appointments
        .iter()
        .flat_map(Appointment::providers)
        .filter(|provider| provider.response == ProviderResponse::Accepted)
        .filter(|provider| seen.insert(provider.uuid.as_str()))
        .collect()
}

/// Appointments whose service is in `service_ids`, or all of them when the
/// filter is empty.
pub fn count_scheduled(appointments: &[Appointment], service_ids: &[String]) -> usize {
    if service_ids.is_empty() {
        return appointments.len();
    }

    appointments
        .iter()
        .filter(|appointment| {
            appointment
                .service_uuid()
                .is_some_and(|uuid| service_ids.iter().any(|id| id == uuid))
        })
        .count()
}
