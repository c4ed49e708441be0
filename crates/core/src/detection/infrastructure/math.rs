//! Shared math utilities for the ONNX inference stages.

use crate::detection::domain::face_detector::FaceDetection;

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Greedy NMS: sort by score descending, suppress boxes overlapping a kept
/// one by more than `iou_thresh`.
pub fn nms(dets: &mut [FaceDetection], iou_thresh: f64) -> Vec<FaceDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i]);
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && dets[i].bbox.iou(&dets[j].bbox) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::geometry::BoundingBox;
    use approx::assert_relative_eq;

    fn det(x: f64, y: f64, size: f64, score: f64) -> FaceDetection {
        FaceDetection {
            bbox: BoundingBox::new(x, y, size, size),
            score,
        }
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert_relative_eq!(p.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let p = softmax(&[1000.0, 1000.0]);
        assert_relative_eq!(p[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![det(0.0, 0.0, 100.0, 0.8), det(5.0, 5.0, 100.0, 0.9)];
        let kept = nms(&mut dets, 0.45);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let mut dets = vec![det(0.0, 0.0, 50.0, 0.9), det(200.0, 200.0, 50.0, 0.8)];
        assert_eq!(nms(&mut dets, 0.45).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut dets: Vec<FaceDetection> = Vec::new();
        assert!(nms(&mut dets, 0.45).is_empty());
    }
}
