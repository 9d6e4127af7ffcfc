use crate::schema::{Arguments, Signature};
use crate::traits::Tool;
use async_trait::async_trait;

pub struct BmiTool;

impl BmiTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BmiTool {
    fn default() -> Self {
        Self::new()
    }
}

pub fn bmi_status(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "underweight"
    } else if bmi < 24.0 {
        "normal"
    } else if bmi < 28.0 {
        "overweight"
    } else {
        "obese"
    }
}

#[async_trait]
impl Tool for BmiTool {
    fn signature(&self) -> Signature {
        Signature::new("calculate_bmi")
            .doc("Calculate BMI given weight in kg and height in meters")
            .param("weight_kg", "number")
            .param("height_m", "number")
    }

    async fn call(&self, args: Arguments) -> anyhow::Result<String> {
        let weight = args.f64("weight_kg")?;
        let height = args.f64("height_m")?;

        anyhow::ensure!(
            weight > 0.0 && height > 0.0,
            "weight_kg and height_m must both be greater than 0"
        );

        let bmi = weight / (height * height);
        Ok(format!("BMI: {:.2} ({})", bmi, bmi_status(bmi)))
    }
}
