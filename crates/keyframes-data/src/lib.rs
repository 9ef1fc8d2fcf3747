// keyframes-data: Serde structs for the Keyframes JSON format
pub mod model;

use model::KfDocument;

pub fn from_str(json: &str) -> serde_json::Result<KfDocument> {
    serde_json::from_str(json)
}

pub fn from_slice(bytes: &[u8]) -> serde_json::Result<KfDocument> {
    serde_json::from_slice(bytes)
}

pub fn from_reader<R: std::io::Read>(reader: R) -> serde_json::Result<KfDocument> {
    serde_json::from_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::model::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let data = json!({
            "frame_rate": 24,
            "animation_frame_count": 48,
            "canvas_size": [100, 100]
        });
        let doc: KfDocument = serde_json::from_value(data).unwrap();
        assert_eq!(doc.frame_rate, 24);
        assert!(doc.features.is_empty());
        assert!(doc.animation_groups.is_empty());
        assert!(doc.bitmaps.is_empty());
    }

    #[test]
    fn test_deserialize_feature() {
        let data = json!({
            "frame_rate": 24,
            "animation_frame_count": 48,
            "canvas_size": [100, 100],
            "features": [
                {
                    "name": "Mouth",
                    "fill_color": "#ff00ff00",
                    "stroke_line_cap": "round",
                    "from_frame": 2,
                    "to_frame": 40.5,
                    "animation_group": 3,
                    "key_frames": [
                        { "start_frame": 0, "data": ["M0,0", "L10,10"] },
                        { "start_frame": 10.0, "data": ["M0,0", "C1,1,2,2,10,20"] }
                    ],
                    "timing_curves": [[[0, 0], [1, 1]]],
                    "feature_animations": [
                        {
                            "property": "ROTATION",
                            "anchor": [5, 5],
                            "key_values": [
                                { "start_frame": 0, "data": [0] },
                                { "start_frame": 10, "data": [90] }
                            ],
                            "timing_curves": [[[0.5, 0], [0.5, 1]]]
                        }
                    ]
                }
            ]
        });
        let doc: KfDocument = serde_json::from_value(data).unwrap();
        let feature = &doc.features[0];
        assert_eq!(feature.name.as_deref(), Some("Mouth"));
        assert_eq!(feature.key_frames[1].start_frame, 10);
        assert_eq!(feature.to_frame, Some(40.5));
        assert_eq!(feature.feature_animations[0].anchor, Some(vec![5.0, 5.0]));
        assert_eq!(
            feature.feature_animations[0].key_values[1].data,
            KfData::Numbers(vec![90.0])
        );
    }

    #[test]
    fn test_fractional_start_frame_rejected() {
        let data = json!({ "start_frame": 1.5, "data": [] });
        let result = serde_json::from_value::<KfValue<Vec<String>>>(data);
        assert!(result.is_err());
    }

    #[test]
    fn test_key_value_shapes() {
        let numbers: KfData = serde_json::from_value(json!([1, 2])).unwrap();
        let number: KfData = serde_json::from_value(json!(3)).unwrap();
        let text: KfData = serde_json::from_value(json!("#ffffff")).unwrap();
        assert_eq!(numbers.as_numbers(), Some(vec![1.0, 2.0]));
        assert_eq!(number.as_numbers(), Some(vec![3.0]));
        assert_eq!(text.as_text(), Some("#ffffff"));
        assert_eq!(text.as_numbers(), None);
    }
}
