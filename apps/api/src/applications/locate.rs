use tracing::warn;

use crate::geo::{Coordinate, Geocoder};
use crate::models::application::ApplicationRow;
use crate::store::ApplicationStore;

/// Fills a missing applicant coordinate from the free-text applicant location.
/// An existing coordinate is returned untouched; geocoding misses yield `None`.
pub async fn resolve_applicant_coordinate(
    store: &dyn ApplicationStore,
    geocoder: &Geocoder,
    application: &mut ApplicationRow,
) -> Option<Coordinate> {
    if let Some(existing) = application.applicant_coordinate() {
        return Some(existing);
    }

    let coordinate = geocoder.resolve(&application.applicant_location).await?;
    application.applicant_latitude = Some(coordinate.lat);
    application.applicant_longitude = Some(coordinate.lon);

    if let Err(e) = store.save_applicant_coordinate(application.id, coordinate).await {
        warn!(
            "Failed to persist applicant coordinate for application {}: {e}",
            application.id
        );
    }
    Some(coordinate)
}
