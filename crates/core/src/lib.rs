pub mod capture {
    pub mod domain {
        pub mod camera;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod age_gender;
        pub mod age_gender_estimator;
        pub mod expression_classifier;
        pub mod expressions;
        pub mod face_analysis;
        pub mod face_detector;
        pub mod face_landmarks;
        pub mod inference_pipeline;
        pub mod landmark_extractor;
    }
    pub mod infrastructure;
}

pub mod export {
    pub mod domain {
        pub mod snapshot_encoder;
    }
    pub mod infrastructure;
    pub mod snapshot;
}

pub mod models {
    pub mod model_loader;
}

pub mod pipeline {
    pub mod analyze_image_use_case;
    pub mod detection_loop;
    pub mod pipeline_logger;
}

pub mod render {
    pub mod overlay;
}

pub mod session {
    pub mod app_mode;
    pub mod session_state;
}

pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod frame;
    pub mod geometry;
    pub mod model_resolver;
}
