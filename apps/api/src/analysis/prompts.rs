// Instruction sent alongside the CV. Field semantics live in the schema descriptions;
// this text sets the response language and the scoring floor.

/// Analysis instruction. The whole answer must be in Spanish.
pub const ANALYSIS_INSTRUCTION: &str = r#"**IMPORTANTE: RESPONDE SIEMPRE EN ESPAÑOL**

Analiza el CV adjunto y proporciona feedback constructivo y detallado. Toda la respuesta debe estar EN ESPAÑOL.

1. FEEDBACK:
   - Identifica 3-5 fortalezas principales del CV
   - Identifica 3-5 áreas de mejora específicas
   - Proporciona un plan de acción concreto con pasos accionables
   - Escribe una conclusión motivadora

2. CV DATA:
   - Extrae y estructura toda la información del CV
   - Optimiza el lenguaje para sistemas ATS
   - Reescribe los bullets con verbos de acción fuertes
   - Mejora el resumen profesional si existe

3. TRACKING:
   - Evalúa el nivel de interés del perfil (Alto/Medio/Bajo)
   - Identifica ciudad y país
   - Sugiere 3-5 puestos afines para este perfil

4. RANKING:
   - Asigna un score de 0-100 (sé generoso pero honesto). Ningún CV legible baja de 40.
   - Bandas: 40-55 Principiante, 56-65 En Camino, 66-75 Competitivo, 76-85 Destacado, 86+ Excepcional
   - El nivel DEBE corresponder a la banda del score
   - Proporciona un mensaje motivador personalizado

Sé constructivo, específico y motivador en todo el análisis. Recuerda: TODO EN ESPAÑOL."#;
