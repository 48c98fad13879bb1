//! # Sample Pipeline Tests
//!
//! End-to-end cycles through the pipeline with fake camera and recognition
//! service, covering every failure stage.

mod common;

#[cfg(test)]
mod tests {
    use super::common::{at, lines, FakeCamera, FixedClock, RecordingSleeper, ScriptedRecognizer, ScriptedService};
    use co2_monitor::monitor_config::PollConfig;
    use co2_monitor::numeric_extraction::AcceptedRange;
    use co2_monitor::pipeline::{SamplePipeline, Sampler};
    use co2_monitor::reading::Reading;
    use co2_monitor::recognition::{JobStatus, RecognitionClient, RecognitionJob};
    use co2_monitor::sample_errors::SampleError;

    fn pipeline(
        camera: FakeCamera,
        results: Vec<Result<Vec<String>, SampleError>>,
    ) -> SamplePipeline<FakeCamera, ScriptedRecognizer, FixedClock> {
        SamplePipeline::new(
            camera,
            ScriptedRecognizer::new(results),
            FixedClock(at(9, 30, 5)),
            AcceptedRange::default(),
        )
    }

    #[tokio::test]
    async fn test_plain_reading_is_accepted() {
        let mut pipeline = pipeline(FakeCamera::default(), vec![Ok(lines(&["450ppm"]))]);

        let reading = pipeline.sample().await.unwrap();
        assert_eq!(reading, Reading::new(at(9, 30, 5), 450));
    }

    #[tokio::test]
    async fn test_label_line_then_spaced_digits() {
        let mut pipeline = pipeline(
            FakeCamera::default(),
            vec![Ok(lines(&["CO2", "  1 2 3 - ppm"]))],
        );

        let err = pipeline.sample().await.unwrap_err();
        // 123 is extracted but lies below the default range.
        assert!(matches!(err, SampleError::Validation { value: 123, .. }));
    }

    #[tokio::test]
    async fn test_label_line_then_spaced_digits_with_wide_range() {
        let mut pipeline = SamplePipeline::new(
            FakeCamera::default(),
            ScriptedRecognizer::new(vec![Ok(lines(&["CO2", "  1 2 3 - ppm"]))]),
            FixedClock(at(9, 30, 5)),
            AcceptedRange::new(100, 5000),
        );

        assert_eq!(pipeline.sample().await.unwrap().value(), 123);
    }

    #[tokio::test]
    async fn test_no_digits_is_extraction_error() {
        let mut pipeline = pipeline(FakeCamera::default(), vec![Ok(lines(&["ERROR", "---"]))]);

        let err = pipeline.sample().await.unwrap_err();
        assert!(matches!(err, SampleError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_values_are_rejected() {
        let mut pipeline = pipeline(
            FakeCamera::default(),
            vec![Ok(lines(&["299"])), Ok(lines(&["300"])), Ok(lines(&["4999"])), Ok(lines(&["5000"]))],
        );

        assert!(matches!(pipeline.sample().await, Err(SampleError::Validation { value: 299, .. })));
        assert_eq!(pipeline.sample().await.unwrap().value(), 300);
        assert_eq!(pipeline.sample().await.unwrap().value(), 4999);
        assert!(matches!(pipeline.sample().await, Err(SampleError::Validation { value: 5000, .. })));
    }

    #[tokio::test]
    async fn test_device_failure_short_circuits() {
        let camera = FakeCamera {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = pipeline(camera, vec![Ok(lines(&["450"]))]);

        let err = pipeline.sample().await.unwrap_err();
        assert!(matches!(err, SampleError::Device(_)));
    }

    #[tokio::test]
    async fn test_failed_job_through_real_client() {
        let service = ScriptedService::new(vec![
            Ok(RecognitionJob::pending(JobStatus::Running)),
            Ok(RecognitionJob::pending(JobStatus::Failed)),
        ]);
        let sleeper = RecordingSleeper::default();
        let client = RecognitionClient::new(&service, &sleeper, "en", PollConfig::default());
        let mut pipeline = SamplePipeline::new(
            FakeCamera::default(),
            client,
            FixedClock(at(9, 30, 5)),
            AcceptedRange::default(),
        );

        let err = pipeline.sample().await.unwrap_err();
        assert!(matches!(err, SampleError::Recognition(_)));

        // The submitted image is the PNG encoding of the captured frame.
        let submitted = service.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert!(submitted[0].0 > 8);
    }

    #[tokio::test]
    async fn test_frame_snapshot_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut pipeline = pipeline(FakeCamera::default(), vec![Ok(lines(&["700"]))])
            .with_frame_snapshot(Some(path.clone()));

        pipeline.sample().await.unwrap();

        let png = std::fs::read(&path).unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!(image.to_rgb8().dimensions(), (4, 2));
    }
}
